//! Asset handles and their download state.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use crate::asset::{AssetDescriptor, AssetKind};
use crate::error::AssetError;

/// Result shared by every caller of one in-flight download.
pub(crate) type Outcome = Result<(), AssetError>;

/// Key a handle is deduplicated by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetIdentity {
    Hash(String),
    Uri(String),
}

/// Where a resolved asset can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Verified (or embedded) copy on local storage.
    Path(PathBuf),
    /// No durable storage: the source URI itself.
    Remote(String),
}

impl Location {
    /// URI form for hosts that take sources as URIs (`file://` for local paths).
    pub fn to_uri(&self) -> String {
        match self {
            Location::Path(p) => url::Url::from_file_path(p)
                .map(|u| u.to_string())
                .unwrap_or_else(|()| p.display().to_string()),
            Location::Remote(uri) => uri.clone(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Remote(uri) => f.write_str(uri),
        }
    }
}

pub(crate) enum Phase {
    Unresolved,
    /// Holds a receiver so late callers can subscribe to the running transfer.
    Downloading(watch::Receiver<Option<Outcome>>),
    Resolved,
}

struct HandleState {
    name: String,
    width: Option<u32>,
    height: Option<u32>,
    location: Option<Location>,
    phase: Phase,
}

/// What a fetch learned about the asset.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub location: Location,
    pub name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// How a call to `ensure_local` should proceed.
pub(crate) enum Begin {
    Resolved,
    /// Another caller started the transfer; wait on its outcome.
    Joined(watch::Receiver<Option<Outcome>>),
    /// This caller owns the transfer and must settle `tx`.
    Started(watch::Sender<Option<Outcome>>, watch::Receiver<Option<Outcome>>),
}

/// One logical asset. Shared as `Arc<AssetHandle>`; identity fields are
/// immutable, download state lives behind a lock that is never held across
/// an await point.
pub struct AssetHandle {
    identity: AssetIdentity,
    hash: Option<String>,
    source_uri: String,
    kind: AssetKind,
    state: Mutex<HandleState>,
}

impl AssetHandle {
    pub(crate) fn from_descriptor(desc: &AssetDescriptor, embedded: Option<PathBuf>) -> Self {
        let identity = match &desc.hash {
            Some(h) => AssetIdentity::Hash(h.clone()),
            None => AssetIdentity::Uri(desc.uri.clone()),
        };
        let (location, phase) = match embedded {
            Some(path) => (Some(Location::Path(path)), Phase::Resolved),
            None => (None, Phase::Unresolved),
        };
        Self {
            identity,
            hash: desc.hash.clone(),
            source_uri: desc.uri.clone(),
            kind: desc.kind.clone(),
            state: Mutex::new(HandleState {
                name: desc.name.clone(),
                width: desc.width,
                height: desc.height,
                location,
                phase,
            }),
        }
    }

    pub(crate) fn from_uri(uri: &str) -> Self {
        Self {
            identity: AssetIdentity::Uri(uri.to_string()),
            hash: None,
            source_uri: uri.to_string(),
            kind: AssetKind::from_uri(uri),
            state: Mutex::new(HandleState {
                name: String::new(),
                width: None,
                height: None,
                location: None,
                phase: Phase::Unresolved,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HandleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn identity(&self) -> &AssetIdentity {
        &self.identity
    }

    /// Expected content hash, if known.
    pub fn hash(&self) -> Option<&str> {
        self.hash.as_deref()
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn kind(&self) -> &AssetKind {
        &self.kind
    }

    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    pub fn width(&self) -> Option<u32> {
        self.lock().width
    }

    pub fn height(&self) -> Option<u32> {
        self.lock().height
    }

    pub fn location(&self) -> Option<Location> {
        self.lock().location.clone()
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.lock().phase, Phase::Resolved)
    }

    pub fn is_downloading(&self) -> bool {
        matches!(self.lock().phase, Phase::Downloading(_))
    }

    /// Best currently-known source: the local location once resolved, else the
    /// original URI. Never waits on a transfer.
    pub fn render_uri(&self) -> String {
        let st = self.lock();
        match (&st.phase, &st.location) {
            (Phase::Resolved, Some(loc)) => loc.to_uri(),
            _ => self.source_uri.clone(),
        }
    }

    /// `name.kind`, used in error messages.
    pub(crate) fn display_name(&self) -> String {
        let name = self.name();
        if self.kind.is_empty() {
            name
        } else {
            format!("{}.{}", name, self.kind)
        }
    }

    /// Atomically inspects the phase and, when unresolved, enters `Downloading`.
    pub(crate) fn begin_download(&self) -> Begin {
        let mut st = self.lock();
        match &st.phase {
            Phase::Resolved => Begin::Resolved,
            Phase::Downloading(rx) => Begin::Joined(rx.clone()),
            Phase::Unresolved => {
                let (tx, rx) = watch::channel(None);
                st.phase = Phase::Downloading(rx.clone());
                Begin::Started(tx, rx)
            }
        }
    }

    /// Leaves `Downloading`: resolved on success, back to unresolved on error.
    pub(crate) fn finish_download(&self, result: Result<Resolution, AssetError>) -> Outcome {
        let mut st = self.lock();
        match result {
            Ok(res) => {
                if let Some(name) = res.name {
                    st.name = name;
                }
                if res.width.is_some() {
                    st.width = res.width;
                }
                if res.height.is_some() {
                    st.height = res.height;
                }
                st.location = Some(res.location);
                st.phase = Phase::Resolved;
                Ok(())
            }
            Err(e) => {
                st.phase = Phase::Unresolved;
                Err(e)
            }
        }
    }
}

impl fmt::Debug for AssetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.lock();
        let phase = match st.phase {
            Phase::Unresolved => "unresolved",
            Phase::Downloading(_) => "downloading",
            Phase::Resolved => "resolved",
        };
        f.debug_struct("AssetHandle")
            .field("identity", &self.identity)
            .field("source_uri", &self.source_uri)
            .field("kind", &self.kind)
            .field("name", &st.name)
            .field("location", &st.location)
            .field("phase", &phase)
            .finish()
    }
}
