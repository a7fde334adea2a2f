pub mod blur;
pub mod composite;
pub mod compositor;
pub mod outcome;
pub mod raster;
pub mod scheduler;
pub mod surface;
pub mod text;
