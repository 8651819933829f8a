pub mod chunk;
pub mod color_math;
pub mod frame_buffer;
pub mod grid;
pub mod pixel;
pub mod pointer;
pub mod records;
pub mod renderer;
pub mod utils;
