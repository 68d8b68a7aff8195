//! Reply normalization.
//!
//! Before a feed entity enters a cache its nested replies are pulled out
//! so each entity is stored exactly once. Normalization happens in two
//! phases:
//! 1. every embedded reply (recursively) is collected for registration
//! 2. the parent's reply list is rewritten to hold only id references
//!
//! Running it on an already-normalized entity is a no-op.

use feedsync_types::{Entity, Reply};

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<E> {
    /// Entities that were embedded anywhere below the root, children
    /// before their parents. Each one is itself normalized.
    pub nested: Vec<E>,
    /// The root entity with a reply list of id references only.
    pub root: E,
}

/// Split an entity into itself plus all embedded replies.
pub fn normalize<E: Entity>(mut root: E) -> Normalized<E> {
    let mut nested = Vec::new();
    extract_replies(&mut root, &mut nested);
    Normalized { nested, root }
}

fn extract_replies<E: Entity>(entity: &mut E, out: &mut Vec<E>) {
    let Some(replies) = entity.replies_mut() else {
        return;
    };

    for reply in replies.iter_mut() {
        if reply.is_ref() {
            continue;
        }
        let id = reply.id();
        if let Reply::Embedded(child) = std::mem::replace(reply, Reply::Ref(id)) {
            let mut child = *child;
            extract_replies(&mut child, out);
            out.push(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedsync_types::{EntityId, FeedItem, Group};

    fn item_with(id: u64, replies: Vec<Reply<FeedItem>>) -> FeedItem {
        let mut item = FeedItem::new(id);
        item.replies = replies;
        item
    }

    #[test]
    fn embedded_replies_become_ids() {
        let root = item_with(
            1,
            vec![
                Reply::Embedded(Box::new(FeedItem::new(2))),
                Reply::Ref(EntityId::new(3)),
            ],
        );

        let out = normalize(root);

        assert_eq!(out.root.reply_ids(), vec![EntityId::new(2), EntityId::new(3)]);
        assert!(out.root.replies.iter().all(Reply::is_ref));
        assert_eq!(out.nested.len(), 1);
        assert_eq!(out.nested[0].id, EntityId::new(2));
    }

    #[test]
    fn nested_replies_are_collected_children_first() {
        let grandchild = FeedItem::new(3);
        let child = item_with(2, vec![Reply::Embedded(Box::new(grandchild))]);
        let root = item_with(1, vec![Reply::Embedded(Box::new(child))]);

        let out = normalize(root);

        let order: Vec<u64> = out.nested.iter().map(|e| e.id.value()).collect();
        assert_eq!(order, vec![3, 2]);
        // The collected child is itself normalized
        assert_eq!(out.nested[1].replies, vec![Reply::Ref(EntityId::new(3))]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let root = item_with(1, vec![Reply::Embedded(Box::new(FeedItem::new(2)))]);

        let first = normalize(root);
        let again = normalize(first.root.clone());

        assert!(again.nested.is_empty());
        assert_eq!(again.root, first.root);
    }

    #[test]
    fn entities_without_replies_pass_through() {
        let group = Group {
            id: EntityId::new(9),
            name: "g".into(),
            slug: None,
            description: None,
            member_count: 0,
            full_detail: true,
        };

        let out = normalize(group.clone());
        assert!(out.nested.is_empty());
        assert_eq!(out.root, group);
    }
}
