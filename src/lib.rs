pub mod all;
pub mod consistency;
pub mod detector;
pub mod flow_estimator;
pub mod frame;
pub mod image;
pub mod input;
pub mod manual;
pub mod optical_flow;
pub mod output;
pub mod palette;
pub mod parameters;
pub mod pipeline;
pub mod pyramid;
pub mod synthetic;
pub mod tracker;
pub mod trajectory;
pub mod types;
pub mod util;
pub mod video;
pub mod visualize;

#[macro_use] extern crate lazy_static;
