use uuid::Uuid;

use crate::models::ConversationKind;

/// Namespace for name-based private conversation ids. Fixed forever:
/// changing it would re-key every existing private conversation.
pub const PRIVATE_CONVERSATION_NAMESPACE: Uuid =
    Uuid::from_u128(0x9f2c_1b40_77aa_4c05_b1e3_52d8_90fe_6a17);

const COMBINED_ID_SEPARATOR: &str = "|";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: Uuid,
    pub is_new: bool,
}

/// Derives a conversation identity from its participant set.
///
/// Group conversations get a fresh random id; the caller's idempotent
/// insert handles races. Private conversations get a deterministic id:
/// the participant ids are sorted descending by canonical string form,
/// joined with a separator that cannot appear inside a UUID, and hashed
/// into a v5 UUID under a fixed namespace. The same unordered pair always
/// resolves to the same id, whichever way the arguments arrive.
///
/// Duplicate participant ids are not deduplicated here; whether a
/// self-conversation is acceptable is the caller's policy.
pub fn resolve(kind: ConversationKind, participant_ids: &[Uuid]) -> Resolved {
    match kind {
        ConversationKind::Group => Resolved {
            id: Uuid::new_v4(),
            is_new: true,
        },
        ConversationKind::Private => Resolved {
            id: combined_private_id(participant_ids),
            is_new: false,
        },
    }
}

fn combined_private_id(participant_ids: &[Uuid]) -> Uuid {
    let mut ids: Vec<String> = participant_ids.iter().map(Uuid::to_string).collect();
    ids.sort_by(|a, b| b.cmp(a));
    let combined = ids.join(COMBINED_ID_SEPARATOR);
    Uuid::new_v5(&PRIVATE_CONVERSATION_NAMESPACE, combined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_id_ignores_argument_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let ab = resolve(ConversationKind::Private, &[a, b]);
        let ba = resolve(ConversationKind::Private, &[b, a]);

        assert_eq!(ab.id, ba.id);
        assert!(!ab.is_new);
    }

    #[test]
    fn private_ids_differ_across_pairs() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let ab = resolve(ConversationKind::Private, &[a, b]);
        let ac = resolve(ConversationKind::Private, &[a, c]);

        assert_ne!(ab.id, ac.id);
    }

    #[test]
    fn private_id_is_stable_across_calls() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = resolve(ConversationKind::Private, &[a, b]);
        let second = resolve(ConversationKind::Private, &[a, b]);

        assert_eq!(first.id, second.id);
    }

    #[test]
    fn duplicate_pair_resolves_without_error() {
        // Self-conversations are not rejected by the resolver.
        let a = Uuid::new_v4();

        let aa = resolve(ConversationKind::Private, &[a, a]);
        let again = resolve(ConversationKind::Private, &[a, a]);

        assert_eq!(aa.id, again.id);
    }

    #[test]
    fn group_ids_are_random() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = resolve(ConversationKind::Group, &[a, b]);
        let second = resolve(ConversationKind::Group, &[a, b]);

        assert_ne!(first.id, second.id);
        assert!(first.is_new);
    }
}
