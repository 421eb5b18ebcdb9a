//! Loading a single module image into a target's code table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{DeployError, RemoteError};
use crate::runtime::{self, RemoteCall, RemoteReply, Runtime};
use crate::types::{ModuleId, Target};

/// Issues the load-module call for a staged module image.
///
/// The load primitive expects the image path without its file extension,
/// so by default the extension is stripped before the call. Runtimes that
/// take the full file name can turn that off.
pub struct ModuleActivator {
    runtime: Arc<dyn Runtime>,
    strip_extension: bool,
}

impl ModuleActivator {
    pub fn new(runtime: Arc<dyn Runtime>, strip_extension: bool) -> Self {
        Self {
            runtime,
            strip_extension,
        }
    }

    /// Path handed to the runtime for a staged image.
    pub fn load_path(&self, staged: &Path) -> PathBuf {
        if self.strip_extension {
            staged.with_extension("")
        } else {
            staged.to_path_buf()
        }
    }

    pub fn activate(&self, target: &Target, staged: &Path) -> Result<ModuleId, DeployError> {
        let path = self.load_path(staged);
        let failure = |source: RemoteError| DeployError::Activation {
            target: target.clone(),
            message: format!("failed to load module {}", path.display()),
            source,
        };

        let reply = runtime::call(
            self.runtime.as_ref(),
            target,
            RemoteCall::LoadModule { path: path.clone() },
        )
        .map_err(failure)?;

        match reply {
            RemoteReply::Module(module) => {
                tracing::info!(node = %target, module = %module, "module activated");
                Ok(module)
            }
            other => Err(failure(RemoteError::rejected(format!(
                "unexpected reply to load_module: {:?}",
                other
            )))),
        }
    }
}

impl std::fmt::Debug for ModuleActivator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleActivator")
            .field("strip_extension", &self.strip_extension)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::runtime::InMemoryRuntime;

    #[test]
    fn load_path_strips_extension_by_default() {
        let activator = ModuleActivator::new(Arc::new(InMemoryRuntime::new()), true);
        assert_eq!(
            activator.load_path(Path::new("/s/hello.beam")),
            PathBuf::from("/s/hello")
        );

        let verbatim = ModuleActivator::new(Arc::new(InMemoryRuntime::new()), false);
        assert_eq!(
            verbatim.load_path(Path::new("/s/hello.beam")),
            PathBuf::from("/s/hello.beam")
        );
    }

    #[test]
    fn activate_sends_stripped_path() {
        let runtime = Arc::new(InMemoryRuntime::new());
        let activator = ModuleActivator::new(runtime.clone(), true);

        let module = activator
            .activate(&Target::new("a@h"), Path::new("/s/hello.beam"))
            .unwrap();

        assert_eq!(module, ModuleId::new("hello"));
        assert_eq!(
            runtime.calls()[0].1,
            RemoteCall::LoadModule {
                path: PathBuf::from("/s/hello")
            }
        );
    }

    #[test]
    fn rejected_load_embeds_target_and_cause() {
        let runtime = Arc::new(InMemoryRuntime::new());
        runtime.fail_module("hello", "module undefined");
        let activator = ModuleActivator::new(runtime, true);

        let err = activator
            .activate(&Target::new("a@h"), Path::new("/s/hello.beam"))
            .unwrap_err();

        assert_eq!(err.stage(), Stage::Activation);
        assert_eq!(err.target(), Some(&Target::new("a@h")));
        assert_eq!(
            err.remote_cause(),
            Some(&RemoteError::rejected("module undefined"))
        );
    }

    struct AckOnly;

    impl Runtime for AckOnly {
        fn invoke(&self, _: &Target, _: RemoteCall) -> Result<RemoteReply, RemoteError> {
            Ok(RemoteReply::Ok)
        }
    }

    #[test]
    fn reply_without_module_is_a_failure() {
        let activator = ModuleActivator::new(Arc::new(AckOnly), true);
        let err = activator
            .activate(&Target::new("a@h"), Path::new("/s/hello.beam"))
            .unwrap_err();
        assert!(matches!(err, DeployError::Activation { .. }));
    }
}
