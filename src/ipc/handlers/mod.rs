pub mod backup;
pub mod core;
pub mod export;
pub mod groups;
pub mod marks;
pub mod roster;
