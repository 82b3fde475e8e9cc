use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Walks `t` with a cursor in both directions and checks it against the
/// model, then runs the structural checks.
fn validate_tree(t: &Tree<u8>, model: &BTreeMap<u8, usize>) {
    assert_eq!(t.verify(), Ok(()));
    assert_eq!(t.len(), model.values().sum::<usize>());

    let expected: Vec<u8> = model
        .iter()
        .flat_map(|(&k, &n)| std::iter::repeat(k).take(n))
        .collect();

    let mut forward = Vec::with_capacity(t.len());
    let mut cursor = Cursor::new(Position::BeforeMin);
    loop {
        let peek = cursor.peek_right(t);
        let moved = cursor.right(t);
        assert_eq!(peek, moved, "peek_right disagrees with right");
        match moved {
            Some(id) => forward.push(t[id]),
            None => break,
        }
    }
    assert_eq!(cursor.position(), Position::AfterMax);
    assert_eq!(forward, expected);

    let mut backward = Vec::with_capacity(t.len());
    loop {
        let peek = cursor.peek_left(t);
        let moved = cursor.left(t);
        assert_eq!(peek, moved, "peek_left disagrees with left");
        match moved {
            Some(id) => backward.push(t[id]),
            None => break,
        }
    }
    assert_eq!(cursor.position(), Position::BeforeMin);
    backward.reverse();
    assert_eq!(backward, expected);

    let collected: Vec<u8> = t.iter().copied().collect();
    assert_eq!(collected, expected);
}

fn model_insert(model: &mut BTreeMap<u8, usize>, key: u8) {
    *model.entry(key).or_insert(0) += 1;
}

fn model_remove(model: &mut BTreeMap<u8, usize>, key: u8) {
    let n = model.get_mut(&key).expect("model is missing a key the tree has");
    *n -= 1;
    if *n == 0 {
        model.remove(&key);
    }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 4)]
    Insert(#[proptest(strategy = "0u8..48")] u8),
    #[proptest(weight = 2)]
    FindOrInsert(#[proptest(strategy = "0u8..48")] u8),
    #[proptest(weight = 3)]
    Delete(#[proptest(strategy = "0u8..48")] u8),
    DeleteMin,
    DeleteMax,
    #[proptest(weight = 2)]
    Rekey {
        #[proptest(strategy = "0u8..48")]
        from: u8,
        #[proptest(strategy = "0u8..48")]
        to: u8,
    },
}

fn apply(t: &mut Tree<u8>, model: &mut BTreeMap<u8, usize>, op: Op) {
    match op {
        Op::Insert(key) => {
            let id = t.insert(key);
            assert_eq!(t[id], key);
            model_insert(model, key);
        }
        Op::FindOrInsert(key) => {
            let len = t.len();
            let id = t.find_or_insert(key);
            assert_eq!(t[id], key);
            if model.contains_key(&key) {
                assert_eq!(t.len(), len);
            } else {
                assert_eq!(t.len(), len + 1);
                model_insert(model, key);
            }
        }
        Op::Delete(key) => match t.find(&key) {
            Some(id) => {
                assert_eq!(t.delete(id), key);
                model_remove(model, key);
            }
            None => assert!(!model.contains_key(&key)),
        },
        Op::DeleteMin => {
            if let Some(id) = t.min() {
                let key = t.delete(id);
                assert_eq!(Some(&key), model.keys().next());
                model_remove(model, key);
            }
        }
        Op::DeleteMax => {
            if let Some(id) = t.max() {
                let key = t.delete(id);
                assert_eq!(Some(&key), model.keys().next_back());
                model_remove(model, key);
            }
        }
        Op::Rekey { from, to } => {
            if let Some(id) = t.find(&from) {
                *t.get_mut(id).expect("found handle is live") = to;
                let id = t.fix(id);
                assert_eq!(t[id], to);
                model_remove(model, from);
                model_insert(model, to);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_matches_counting_model(ops in prop::collection::vec(any::<Op>(), 0..=400)) {
        let mut t: Tree<u8> = Tree::new();
        let mut model: BTreeMap<u8, usize> = BTreeMap::new();

        for op in ops {
            apply(&mut t, &mut model, op);
            prop_assert_eq!(t.verify(), Ok(()));
            prop_assert_eq!(t.len(), model.values().sum::<usize>());
        }

        validate_tree(&t, &model);

        while let Some(id) = t.min() {
            t.delete(id);
            prop_assert_eq!(t.verify(), Ok(()));
        }
        prop_assert_eq!(t.max(), None);
    }

    #[test]
    fn prop_find_with_or_insert_with_constructs_on_miss_only(
        keys in prop::collection::vec(0u8..32, 0..=200),
    ) {
        let mut t: Tree<u8> = Tree::new();
        let mut made = 0usize;
        for key in keys {
            let present = t.find(&key).is_some();
            let before = made;
            let id = t.find_with_or_insert_with(
                |v| key.cmp(v),
                || {
                    made += 1;
                    key
                },
            );
            prop_assert_eq!(t[id], key);
            prop_assert_eq!(made - before, usize::from(!present));
        }
        prop_assert_eq!(made, t.len());
        prop_assert_eq!(t.verify(), Ok(()));
    }

    #[test]
    fn prop_cursor_steps_match_next_prev(keys in prop::collection::vec(any::<u8>(), 1..=200)) {
        let t: Tree<u8> = keys.into_iter().collect();
        let mut id = t.min().expect("non-empty");
        let mut steps = 1;
        while let Some(next) = t.next(id) {
            prop_assert_eq!(t.prev(next), Some(id));
            prop_assert_eq!(Cursor::at(id).peek_right(&t), Some(next));
            prop_assert!(!t[next].precedes(&t[id]));
            id = next;
            steps += 1;
        }
        prop_assert_eq!(Some(id), t.max());
        prop_assert_eq!(steps, t.len());
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 3];

    for_each_permutation(&keys, |perm| {
        let mut t: Tree<u8> = Tree::new();
        let mut model = BTreeMap::new();
        for k in perm {
            t.insert(k);
            model_insert(&mut model, k);
            assert_eq!(t.verify(), Ok(()));
        }
        validate_tree(&t, &model);
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let keys: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7];

    // Insert in a fixed order, then delete in all permutations.
    let base: Tree<u8> = keys.iter().copied().collect();
    let mut base_model = BTreeMap::new();
    for &k in &keys {
        model_insert(&mut base_model, k);
    }

    for_each_permutation(&keys, |perm| {
        let mut t = base.clone();
        let mut model = base_model.clone();

        for k in perm {
            let id = t.find(&k).expect("key inserted above");
            assert_eq!(t.delete(id), k);
            model_remove(&mut model, k);
            validate_tree(&t, &model);
        }
        assert!(t.is_empty());
        assert!(t.root.is_nil());
    });
}

#[test]
fn exhaustive_fix_every_node_small_set() {
    let keys: Vec<u8> = (0..12).collect();

    for target in 0..12u8 {
        for to in [0u8, 5, 11, 20] {
            let mut t: Tree<u8> = keys.iter().copied().collect();
            let mut model = BTreeMap::new();
            for &k in &keys {
                model_insert(&mut model, k);
            }

            let id = t.find(&target).expect("key inserted above");
            *t.get_mut(id).expect("live handle") = to;
            let id = t.fix(id);
            assert_eq!(t[id], to);
            model_remove(&mut model, target);
            model_insert(&mut model, to);
            validate_tree(&t, &model);
        }
    }
}
