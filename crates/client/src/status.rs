use std::fmt;

/// Stage of a submission as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Preparing,
    Uploading,
    /// Bytes on the wire, percent below 100
    Progress(u8),
    /// Relay has the whole archive and is forwarding it
    Transferring,
    Finalizing,
}

impl SubmitStatus {
    pub fn from_bytes(sent: u64, total: u64) -> Self {
        if total == 0 {
            return SubmitStatus::Transferring;
        }
        let percent = ((sent as f64 / total as f64) * 100.0).round() as u64;
        if percent < 100 {
            SubmitStatus::Progress(percent as u8)
        } else {
            SubmitStatus::Transferring
        }
    }
}

impl fmt::Display for SubmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitStatus::Idle => Ok(()),
            SubmitStatus::Preparing => f.write_str("Preparing secure transmission..."),
            SubmitStatus::Uploading => f.write_str("Uploading to secure storage..."),
            SubmitStatus::Progress(n) => write!(f, "Uploading: {}%", n),
            SubmitStatus::Transferring => f.write_str(
                "File received! Encrypting & Transferring to MEGA... (This may take a while)",
            ),
            SubmitStatus::Finalizing => f.write_str("Finalizing submission..."),
        }
    }
}
