//! View-layer state shared by table and focus screens.

pub mod selection;
