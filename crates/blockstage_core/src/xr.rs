//! Immersive (XR) session state

use thiserror::Error;

/// Errors from the XR experience
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum XrError {
    /// The experience was already disposed
    #[error("XR experience already disposed")]
    Disposed,
}

/// The XR experience attached to a scene
#[derive(Debug, Default)]
pub struct XrExperience {
    in_session: bool,
    disposed: bool,
}

impl XrExperience {
    /// Create an idle experience
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an immersive session
    pub fn enter_session(&mut self) -> Result<(), XrError> {
        if self.disposed {
            return Err(XrError::Disposed);
        }
        self.in_session = true;
        log::info!("Entered XR session");
        Ok(())
    }

    /// Leave the immersive session, if one is active
    pub fn exit_session(&mut self) -> Result<(), XrError> {
        if self.disposed {
            return Err(XrError::Disposed);
        }
        if self.in_session {
            self.in_session = false;
            log::info!("Exited XR session");
        }
        Ok(())
    }

    /// Whether a session is active
    pub fn in_session(&self) -> bool {
        self.in_session
    }

    /// Dispose the experience
    pub fn dispose(&mut self) -> Result<(), XrError> {
        if self.disposed {
            return Err(XrError::Disposed);
        }
        self.in_session = false;
        self.disposed = true;
        Ok(())
    }

    /// Whether the experience has been disposed
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cycle() {
        let mut xr = XrExperience::new();
        xr.enter_session().unwrap();
        assert!(xr.in_session());
        xr.exit_session().unwrap();
        assert!(!xr.in_session());
        xr.dispose().unwrap();
        assert_eq!(xr.enter_session(), Err(XrError::Disposed));
        assert_eq!(xr.dispose(), Err(XrError::Disposed));
    }
}
