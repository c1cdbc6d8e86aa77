pub mod html;

pub use reqwest::Client;
