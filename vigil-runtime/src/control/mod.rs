pub use bank::{ControllerBank, Corrections};
pub use mapper::ActuationMapper;

mod bank;
mod mapper;
