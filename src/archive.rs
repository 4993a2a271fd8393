use crate::importer::{CleanedConversation, MessageRecord};
use crate::utils::allocate_file_name;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationArchiveEntry {
    #[serde(flatten)]
    pub conversation: CleanedConversation,
    pub msg_list: Vec<MessageRecord>,
    /// When this archive run happened.
    pub arch_dt: String,
    pub file_name: String,
}

impl ConversationArchiveEntry {
    pub fn uuid(&self) -> &str {
        &self.conversation.uuid
    }
}

/// Position of an entry inside [`Archive::buckets`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct EntryRef {
    bucket: String,
    index: usize,
}

/// Every conversation of one run, grouped by day. The most recent
/// conversation is a view into its bucket, not a second copy; it is only
/// written out in full when serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    generated_at: String,
    most_recent: Option<EntryRef>,
    buckets: BTreeMap<String, Vec<ConversationArchiveEntry>>,
}

impl Archive {
    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    pub fn most_recent(&self) -> Option<&ConversationArchiveEntry> {
        let at = self.most_recent.as_ref()?;
        self.buckets.get(&at.bucket)?.get(at.index)
    }

    pub fn buckets(&self) -> &BTreeMap<String, Vec<ConversationArchiveEntry>> {
        &self.buckets
    }

    pub fn entries(&self) -> impl Iterator<Item = &ConversationArchiveEntry> {
        self.buckets.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for Archive {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct ArchiveDocument<'a> {
            generated_at: &'a str,
            most_recent: Option<&'a ConversationArchiveEntry>,
            buckets: &'a BTreeMap<String, Vec<ConversationArchiveEntry>>,
        }

        ArchiveDocument {
            generated_at: &self.generated_at,
            most_recent: self.most_recent(),
            buckets: &self.buckets,
        }
        .serialize(serializer)
    }
}

/// Build the archive. `message_lookup` is called once per conversation, in
/// input order, before that conversation is filed into its bucket.
pub fn assemble<F>(
    most_recent_uuid: Option<&str>,
    cleaned: Vec<CleanedConversation>,
    mut message_lookup: F,
    run_timestamp: &str,
) -> Archive
where
    F: FnMut(&str) -> Vec<MessageRecord>,
{
    let mut buckets: BTreeMap<String, Vec<ConversationArchiveEntry>> = BTreeMap::new();
    let mut most_recent = None;

    for conversation in cleaned {
        let msg_list = message_lookup(&conversation.uuid);
        let file_name =
            allocate_file_name(&conversation.bucket, &conversation.name, &conversation.uuid);
        let bucket = conversation.bucket.clone();
        let is_most_recent =
            most_recent.is_none() && most_recent_uuid == Some(conversation.uuid.as_str());

        let slot = buckets.entry(bucket.clone()).or_default();
        if is_most_recent {
            most_recent = Some(EntryRef {
                bucket,
                index: slot.len(),
            });
        }
        slot.push(ConversationArchiveEntry {
            conversation,
            msg_list,
            arch_dt: run_timestamp.to_string(),
            file_name,
        });
    }

    Archive {
        generated_at: run_timestamp.to_string(),
        most_recent,
        buckets,
    }
}
