use formats::GeoJsonError;
use layers::RegistryError;
use map::MapError;

use crate::config::ConfigError;

#[derive(Debug)]
pub enum FetchError {
    Io(std::io::Error),
    NotFound(String),
    Status { url: String, status: u16 },
    Network(String),
    InvalidData(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Io(e) => write!(f, "IO error: {e}"),
            FetchError::NotFound(what) => write!(f, "not found: {what}"),
            FetchError::Status { url, status } => write!(f, "HTTP {status} from {url}"),
            FetchError::Network(msg) => write!(f, "network error: {msg}"),
            FetchError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FetchError {
    fn from(e: std::io::Error) -> Self {
        FetchError::Io(e)
    }
}

impl From<GeoJsonError> for FetchError {
    fn from(e: GeoJsonError) -> Self {
        FetchError::InvalidData(e.to_string())
    }
}

#[derive(Debug)]
pub enum ViewerError {
    Config(ConfigError),
    Registry(RegistryError),
    Map(MapError),
    Fetch(FetchError),
    UnknownLayer(String),
}

impl std::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerError::Config(e) => write!(f, "configuration: {e}"),
            ViewerError::Registry(e) => write!(f, "registry: {e}"),
            ViewerError::Map(e) => write!(f, "map: {e}"),
            ViewerError::Fetch(e) => write!(f, "fetch: {e}"),
            ViewerError::UnknownLayer(id) => write!(f, "no layer named {id} in the registry"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::Config(e) => Some(e),
            ViewerError::Registry(e) => Some(e),
            ViewerError::Map(e) => Some(e),
            ViewerError::Fetch(e) => Some(e),
            ViewerError::UnknownLayer(_) => None,
        }
    }
}

impl From<ConfigError> for ViewerError {
    fn from(e: ConfigError) -> Self {
        ViewerError::Config(e)
    }
}

impl From<RegistryError> for ViewerError {
    fn from(e: RegistryError) -> Self {
        ViewerError::Registry(e)
    }
}

impl From<MapError> for ViewerError {
    fn from(e: MapError) -> Self {
        ViewerError::Map(e)
    }
}

impl From<FetchError> for ViewerError {
    fn from(e: FetchError) -> Self {
        ViewerError::Fetch(e)
    }
}
