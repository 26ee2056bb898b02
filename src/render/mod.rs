pub mod background;
pub mod backend;
pub mod canvas;
pub mod frame;
pub mod highlight;
