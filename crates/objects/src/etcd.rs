//! Etcd member records
//!
//! An [`EtcdMember`] is what `etcdadm info` reports for the local member. The
//! cluster keeps every known member in an [`EtcdMemberSet`], keyed by member id.

use crate::error::ObjectError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One participant in the etcd consensus cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtcdMember {
    /// 64-bit member id (`ID` in `etcdadm info` output)
    #[serde(alias = "ID")]
    pub id: u64,

    /// Member name
    #[serde(default)]
    pub name: String,

    /// Peer URLs
    #[serde(rename = "peerURLs", default)]
    pub peer_urls: Vec<String>,

    /// Client URLs
    #[serde(rename = "clientURLs", default)]
    pub client_urls: Vec<String>,
}

impl EtcdMember {
    /// Parse the JSON object printed by `etcdadm info`
    pub fn from_info_output(stdout: &[u8]) -> Result<Self, ObjectError> {
        let member: EtcdMember = serde_json::from_slice(stdout)?;
        Ok(member)
    }

    /// The URL other members join through
    pub fn first_client_url(&self) -> Result<&str, ObjectError> {
        self.client_urls.first().map(String::as_str).ok_or_else(|| {
            ObjectError::Validation(format!(
                "etcd member {} ({}) has no client URLs",
                self.id, self.name
            ))
        })
    }
}

/// Set of etcd members keyed by id
///
/// Insertion overwrites by id, removal is by id, and iteration is id-ascending.
/// Serializes as a plain list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<EtcdMember>", into = "Vec<EtcdMember>")]
pub struct EtcdMemberSet {
    members: BTreeMap<u64, EtcdMember>,
}

impl EtcdMemberSet {
    /// Insert or overwrite the member with the same id
    pub fn insert(&mut self, member: EtcdMember) {
        self.members.insert(member.id, member);
    }

    /// Remove the member with `member`'s id; absent members are ignored
    pub fn remove(&mut self, member: &EtcdMember) -> Option<EtcdMember> {
        self.remove_id(member.id)
    }

    /// Remove by id; absent ids are ignored
    pub fn remove_id(&mut self, id: u64) -> Option<EtcdMember> {
        self.members.remove(&id)
    }

    /// Members sorted ascending by id
    pub fn list(&self) -> Vec<EtcdMember> {
        self.members.values().cloned().collect()
    }

    /// Lowest-id member, if any
    pub fn first(&self) -> Option<&EtcdMember> {
        self.members.values().next()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a member with `id` is present
    pub fn contains(&self, id: u64) -> bool {
        self.members.contains_key(&id)
    }
}

impl From<Vec<EtcdMember>> for EtcdMemberSet {
    fn from(members: Vec<EtcdMember>) -> Self {
        let mut set = Self::default();
        for member in members {
            set.insert(member);
        }
        set
    }
}

impl From<EtcdMemberSet> for Vec<EtcdMember> {
    fn from(set: EtcdMemberSet) -> Self {
        set.members.into_values().collect()
    }
}

impl FromIterator<EtcdMember> for EtcdMemberSet {
    fn from_iter<I: IntoIterator<Item = EtcdMember>>(iter: I) -> Self {
        let mut set = Self::default();
        for member in iter {
            set.insert(member);
        }
        set
    }
}
