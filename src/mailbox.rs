//! # Mailbox naming.

use crate::constants::{FOLDERS_PREFIX, LABELS_PREFIX};
use crate::remote::{Label, LabelType};

/// Derives the protocol-visible mailbox name of a label.
///
/// User folders and labels are grouped under their prefix segment; system
/// and contact-group mailboxes keep their path unprefixed.
pub fn mailbox_name(label: &Label) -> Vec<String> {
    match label.label_type {
        LabelType::Folder => prefixed(FOLDERS_PREFIX, &label.path),
        LabelType::Label => prefixed(LABELS_PREFIX, &label.path),
        LabelType::System | LabelType::ContactGroup => label.path.clone(),
    }
}

fn prefixed(prefix: &str, path: &[String]) -> Vec<String> {
    let mut name = Vec::with_capacity(path.len() + 1);
    name.push(prefix.to_string());
    name.extend(path.iter().cloned());
    name
}
