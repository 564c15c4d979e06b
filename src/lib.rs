pub mod browser;
pub mod config;
pub mod date;
pub mod driver;
pub mod element;
pub mod error;
pub mod fake;
pub mod fields;
pub mod page;
pub mod scenario;
pub mod select;

pub use browser::ChromeSession;
pub use config::{ScenarioConfig, SessionConfig};
pub use date::{DateValue, DateWidgetEditor, Segment};
pub use driver::{FieldElement, FieldLocator, FormDriver, Key, ScreenshotFormat, SelectOption};
pub use error::{Error, Result};
pub use fields::TextInput;
pub use scenario::ScenarioRunner;
pub use select::SelectController;
