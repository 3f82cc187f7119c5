use lktrack::all::*;

use softbuffer::GraphicsContext;
use winit::event::{ElementState, Event, KeyboardInput, MouseButton, VirtualKeyCode, WindowEvent};
use winit::event_loop::ControlFlow;
use winit::window::Window;

pub struct EventLoopArgs<'a> {
  pub input: &'a mut dyn FrameSource,
  pub pipeline: &'a mut Pipeline,
  pub graphics_context: &'a mut GraphicsContext<Window>,
  pub buffer: Vec<u32>,
  // Last cursor position in window pixels, which match the frame pixels.
  pub cursor: Vector2d,
  pub frame_count: usize,
}

pub fn handle_event(
  event: Event<()>,
  control_flow: &mut ControlFlow,
  args: &mut EventLoopArgs,
) -> Result<()> {
  let (window_width, window_height) = {
    let size = args.graphics_context.window().inner_size();
    (size.width as usize, size.height as usize)
  };

  match event {
    Event::RedrawRequested(window_id) if window_id == args.graphics_context.window().id() => {
      if args.buffer.len() == window_width * window_height {
        args.graphics_context.set_buffer(&args.buffer, window_width as u16, window_height as u16);
      }
    },
    Event::WindowEvent {
      event,
      window_id,
    } if window_id == args.graphics_context.window().id() => {
      match event {
        WindowEvent::CloseRequested => *control_flow = ControlFlow::Exit,
        WindowEvent::KeyboardInput {
          input: KeyboardInput {
            state: ElementState::Pressed,
            virtual_keycode: Some(keycode),
            ..
          },
          ..
        } => {
          match keycode {
            VirtualKeyCode::Escape | VirtualKeyCode::Q => {
              *control_flow = ControlFlow::Exit;
            },
            VirtualKeyCode::C => {
              info!("Cleared history.");
              args.pipeline.clear_history();
              args.pipeline.select(SelectionEvent::Cleared);
            },
            _ => {}, // Other keys.
          }
        },
        WindowEvent::CursorMoved { position, .. } => {
          args.cursor = Vector2d::new(position.x, position.y);
        },
        WindowEvent::MouseInput {
          state: ElementState::Pressed,
          button: MouseButton::Left,
          ..
        } => {
          args.pipeline.select(SelectionEvent::PointSelected(args.cursor));
        },
        _ => {}, // Other window events.
      }
    },
    Event::MainEventsCleared => {
      if *control_flow == ControlFlow::Exit { return Ok(()) }
      match args.input.next_frame()? {
        Some(frame) => {
          args.pipeline.process(frame)?;
          args.frame_count += 1;
          let canvas = args.pipeline.render(frame);
          if canvas.width == window_width && canvas.height == window_height {
            args.buffer.clear();
            args.buffer.extend_from_slice(&canvas.data);
            args.graphics_context.window().request_redraw();
          }
        },
        None => *control_flow = ControlFlow::Exit,
      }
    },
    _ => {}, // Other events.
  }
  Ok(())
}
