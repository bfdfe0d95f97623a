//! Application Services
//!
//! Use cases behind the three RPC services.
//!
//! - `CalculatorService`: sum, square root and the streaming aggregators
//! - `GreeterService`: greetings over every call shape, plus the deadline demo
//! - `BlogService`: create/read/update/delete/list over a [`BlogStore`](crate::application::ports::BlogStore)

mod blog;
mod calculator;
mod greeter;

pub use blog::BlogService;
pub use calculator::{CalculatorService, CalculatorSettings};
pub use greeter::{GreeterService, GreeterSettings};
