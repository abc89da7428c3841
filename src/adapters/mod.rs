//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `hardware`     | ActuatorPort       | embedded-hal output pins      |
//! | `log_sink`     | EventSink          | `log` facade                  |
//! | `config_store` | ConfigPort         | JSON file / postcard blob     |
//! | `sim`          | SensorPort         | simulated enclosure physics   |
//! |                | ActuatorPort       |                               |
//! | `time`         | none               | monotonic millisecond clock   |

pub mod config_store;
pub mod hardware;
pub mod log_sink;
pub mod sim;
pub mod time;
