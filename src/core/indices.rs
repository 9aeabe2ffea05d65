use hashbrown::HashMap;

use crate::types::EventSeq;

/// Secondary index from a key to the ascending sequences of its events.
pub type VecIndex<K> = HashMap<K, Vec<EventSeq>>;

pub(crate) fn insert_sorted(v: &mut Vec<EventSeq>, seq: EventSeq) {
    match v.last() {
        Some(last) if *last < seq => v.push(seq),
        None => v.push(seq),
        _ => {
            if let Err(pos) = v.binary_search(&seq) {
                v.insert(pos, seq);
            }
        }
    }
}

pub(crate) fn remove_sorted(v: &mut Vec<EventSeq>, seq: EventSeq) {
    if let Ok(pos) = v.binary_search(&seq) {
        v.remove(pos);
    }
}
