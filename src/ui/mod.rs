/// User interface: the full-screen viewer window and its frame presenter
pub mod frame;
pub mod viewer;
