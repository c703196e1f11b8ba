pub mod connection;

pub use connection::{connect_to_mass_ship_page, is_mass_ship_page};
