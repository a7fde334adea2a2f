pub mod kind;
pub mod kinds;
pub mod parameter;
pub mod set;
pub mod table;
pub mod undo;
