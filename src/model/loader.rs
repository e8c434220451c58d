use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::{Condvar, Mutex};

use super::{load_model, Model, ModelError};

/// Lifecycle of a background model load.
#[derive(Debug)]
pub enum LoadState {
    Loading,
    Ready(Model),
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

struct Shared {
    state: Mutex<LoadState>,
    finished: Condvar,
}

/// Parses a model on a worker thread.
///
/// The worker is detached: dropping the loader does not cancel the parse, the
/// result is simply discarded when it arrives.
pub struct ModelLoader {
    path: PathBuf,
    shared: Arc<Shared>,
    taken: bool,
}

impl ModelLoader {
    pub fn spawn(path: impl AsRef<Path>) -> Self {
        Self::spawn_with(path, load_model)
    }

    fn spawn_with<F>(path: impl AsRef<Path>, load: F) -> Self
    where
        F: FnOnce(&Path) -> Result<Model, ModelError> + Send + 'static,
    {
        let path = path.as_ref().to_path_buf();
        let shared = Arc::new(Shared {
            state: Mutex::new(LoadState::Loading),
            finished: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name("model-loader".into())
            .spawn(move || {
                // A panicking parser must still end in a terminal state, or
                // `wait` would block forever.
                let state = match panic::catch_unwind(AssertUnwindSafe(|| load(&worker_path))) {
                    Ok(Ok(model)) => LoadState::Ready(model),
                    Ok(Err(err)) => LoadState::Failed(error_chain(&err)),
                    Err(panic) => LoadState::Failed(format!(
                        "loader thread panicked: {}",
                        panic_message(panic.as_ref())
                    )),
                };
                *worker_shared.state.lock() = state;
                worker_shared.finished.notify_all();
            });
        if let Err(err) = spawned {
            *shared.state.lock() =
                LoadState::Failed(format!("could not start loader thread: {err}"));
        }

        Self {
            path,
            shared,
            taken: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the terminal state the first time it is observed, `None` while
    /// loading or after the result has been taken.
    pub fn poll(&mut self) -> Option<LoadState> {
        if self.taken {
            return None;
        }
        let mut state = self.shared.state.lock();
        if state.is_loading() {
            return None;
        }
        self.taken = true;
        Some(std::mem::replace(&mut *state, LoadState::Loading))
    }

    /// Blocks until the load finishes and takes its result.
    pub fn wait(&mut self) -> Option<LoadState> {
        if self.taken {
            return None;
        }
        let mut state = self.shared.state.lock();
        while state.is_loading() {
            self.shared.finished.wait(&mut state);
        }
        self.taken = true;
        Some(std::mem::replace(&mut *state, LoadState::Loading))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_load_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let mut loader = ModelLoader::spawn(&path);
        match loader.wait() {
            Some(LoadState::Ready(model)) => assert_eq!(model.triangle_count(), 1),
            other => panic!("unexpected state {other:?}"),
        }
        assert!(loader.poll().is_none());
        assert!(loader.wait().is_none());
    }

    #[test]
    fn missing_file_fails_with_cause() {
        let mut loader = ModelLoader::spawn("missing/scene.gltf");
        let message = loop {
            match loader.poll() {
                Some(LoadState::Failed(message)) => break message,
                Some(other) => panic!("unexpected state {other:?}"),
                None => thread::yield_now(),
            }
        };
        assert!(message.contains("missing/scene.gltf"), "{message}");
    }

    #[test]
    fn panicking_parser_fails_instead_of_hanging() {
        let mut loader = ModelLoader::spawn_with("boom.obj", |_| panic!("bad mesh"));
        match loader.wait() {
            Some(LoadState::Failed(message)) => {
                assert_eq!(message, "loader thread panicked: bad mesh")
            }
            other => panic!("unexpected state {other:?}"),
        }
    }
}
