pub mod crop;
pub mod generate;
pub mod intake;
pub mod segment;
