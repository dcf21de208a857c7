//! Interface cleanup policy applied before first boot.

use tracing::{debug, info, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::{ConfigPath, ConfigTree};

pub const DEFAULT_INTERFACES_PATH: [&str; 2] = ["interfaces", "ethernet"];
pub const DEFAULT_KEEP_INTERFACE: &str = "eth0";
pub const DEFAULT_HW_ID_LEAF: &str = "hw-id";

/// Which interfaces survive and which leaf binds them to hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    /// Container holding one child per interface
    pub interfaces_path: ConfigPath,
    /// Interface kept for first boot connectivity
    pub keep_interface: String,
    /// Leaf stripped from the kept interface
    pub hw_id_leaf: String,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self {
            interfaces_path: ConfigPath::from(DEFAULT_INTERFACES_PATH),
            keep_interface: DEFAULT_KEEP_INTERFACE.to_string(),
            hw_id_leaf: DEFAULT_HW_ID_LEAF.to_string(),
        }
    }
}

impl SanitizePolicy {
    pub fn new(
        interfaces_path: ConfigPath,
        keep_interface: impl Into<String>,
        hw_id_leaf: impl Into<String>,
    ) -> Self {
        Self {
            interfaces_path,
            keep_interface: keep_interface.into(),
            hw_id_leaf: hw_id_leaf.into(),
        }
    }
}

/// What a policy run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    /// Path of the hardware-identity leaf that was deleted
    pub stripped_hw_id: Option<ConfigPath>,
    /// Interfaces deleted entirely, in document order
    pub removed: Vec<String>,
    /// Whether the keep-interface was present
    pub kept: bool,
}

impl SanitizeReport {
    pub fn is_noop(&self) -> bool {
        self.stripped_hw_id.is_none() && self.removed.is_empty()
    }
}

/// Strip the hardware binding from the keep-interface and delete every other
/// interface under the container path.
///
/// A missing container, a missing keep-interface, or a keep-interface without
/// the hardware leaf are all no-ops, so running twice is safe. The hardware
/// leaf is deleted whatever its value shape.
///
/// # Errors
/// `InvalidPath` if the container path is the root, since every top-level
/// node would then count as an interface. `NotFound` only if the tree changes
/// under the traversal, which cannot happen with exclusive access.
#[instrument(level = "debug", skip(tree, policy), fields(keep = %policy.keep_interface))]
pub fn sanitize(tree: &mut ConfigTree, policy: &SanitizePolicy) -> DomainResult<SanitizeReport> {
    if policy.interfaces_path.is_root() {
        return Err(DomainError::InvalidPath(
            "interface container cannot be the root node".to_string(),
        ));
    }

    let mut report = SanitizeReport::default();

    if !tree.exists(&policy.interfaces_path) {
        debug!("no {} in document, nothing to clean", policy.interfaces_path);
        return Ok(report);
    }

    for interface in tree.list_nodes(&policy.interfaces_path)? {
        let interface_path = policy.interfaces_path.join(interface.as_str());
        if interface == policy.keep_interface {
            report.kept = true;
            let hw_id_path = interface_path.join(policy.hw_id_leaf.as_str());
            if tree.exists(&hw_id_path) {
                tree.delete(&hw_id_path)?;
                info!("stripped {}", hw_id_path);
                report.stripped_hw_id = Some(hw_id_path);
            }
        } else {
            tree.delete(&interface_path)?;
            info!("removed {}", interface_path);
            report.removed.push(interface);
        }
    }

    Ok(report)
}
