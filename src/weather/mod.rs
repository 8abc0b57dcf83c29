//! Weather lookup domain: city normalization, upstream access and the
//! cache-aside service tying the stores together.

pub mod city;
pub mod client;
pub mod error;
pub mod service;
pub mod types;

pub use client::OpenWeatherClient;
pub use error::WeatherError;
pub use service::{ServiceSettings, WeatherService};
