//! bootscrub: sanitize a router boot configuration before first boot.
//!
//! The boot configuration is parsed into a [`domain::ConfigTree`], the
//! [`domain::sanitize`] policy strips the hardware binding from the kept
//! interface and deletes every other interface, and the tree is written back.
//!
//! ```
//! use bootscrub::domain::{sanitize, ConfigPath, ConfigTree, SanitizePolicy};
//!
//! let mut tree = ConfigTree::parse(
//!     "interfaces {\n    ethernet eth0 {\n        hw-id 00:11:22:33:44:55\n    }\n    ethernet eth1 {\n    }\n}\n",
//! )
//! .unwrap();
//! sanitize(&mut tree, &SanitizePolicy::default()).unwrap();
//! assert!(!tree.exists(&ConfigPath::from(["interfaces", "ethernet", "eth1"])));
//! assert_eq!(tree.serialize(), "interfaces {\n    ethernet eth0 {\n    }\n}\n");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
