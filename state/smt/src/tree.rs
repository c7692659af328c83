//! Store-backed sparse Merkle tree

use std::sync::Arc;

use ark_ff::Zero;

use sigil_hash::{fr_bit, fr_from_le_bytes, fr_to_hex, fr_to_le_bytes, Fr};
use sigil_store::{keys, Store};

use crate::{Node, NodeAux, Proof, SmtError, SmtResult};

/// Fixed-depth sparse Merkle tree persisted through a `Store`
///
/// Mutations take `&mut self`; callers serialize writers (the state engine
/// wraps its trees in one write lock). Node writes are content-addressed
/// and the root pointer is written last, so an interrupted mutation leaves
/// the persisted tree at its prior root.
pub struct SparseMerkleTree {
    store: Arc<dyn Store>,
    tree_id: String,
    depth: usize,
    root: Fr,
}

impl SparseMerkleTree {
    /// Open a tree, restoring the persisted root pointer if present
    pub fn open(store: Arc<dyn Store>, tree_id: &str, depth: usize) -> SmtResult<Self> {
        let root = match store.get(keys::tree_root_key(tree_id).as_bytes())? {
            Some(bytes) => fr_from_le_bytes(&bytes)?,
            None => Fr::zero(),
        };

        Ok(Self {
            store,
            tree_id: tree_id.to_string(),
            depth,
            root,
        })
    }

    /// Current root hash
    pub fn root(&self) -> Fr {
        self.root
    }

    /// Tree depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Insert a new key
    ///
    /// Fails with `KeyExists` when the key is already present and
    /// `DepthExceeded` when the key shares all `depth` low-order bits with
    /// an existing one.
    pub fn add(&mut self, key: Fr, value: Fr) -> SmtResult<()> {
        let mut batch = Vec::new();
        let new_root = self.add_at(self.root, key, value, 0, &mut batch)?;

        self.flush(&batch)?;
        self.set_root(new_root)
    }

    /// Replace the value of an existing key, returning the previous value
    pub fn update(&mut self, key: Fr, value: Fr) -> SmtResult<Fr> {
        // Path of traversed middle nodes: (left, right, followed-right?)
        let mut path: Vec<(Fr, Fr, bool)> = Vec::new();
        let mut current = self.root;
        let mut level = 0usize;

        let old_value = loop {
            match self.load_node(&current)? {
                Node::Empty => return Err(SmtError::KeyNotFound),
                Node::Leaf { key: ek, value: ev } => {
                    if ek != key {
                        return Err(SmtError::KeyNotFound);
                    }
                    break ev;
                }
                Node::Middle { left, right } => {
                    if level >= self.depth {
                        return Err(SmtError::DepthExceeded(self.depth));
                    }
                    let go_right = fr_bit(&key, level);
                    path.push((left, right, go_right));
                    current = if go_right { right } else { left };
                    level += 1;
                }
            }
        };

        let mut batch = Vec::new();
        let leaf = Node::Leaf { key, value };
        let mut hash = leaf.hash()?;
        batch.push((hash, leaf));

        for (left, right, went_right) in path.into_iter().rev() {
            let node = if went_right {
                Node::Middle { left, right: hash }
            } else {
                Node::Middle { left: hash, right }
            };
            hash = node.hash()?;
            batch.push((hash, node));
        }

        self.flush(&batch)?;
        self.set_root(hash)?;
        Ok(old_value)
    }

    /// Look up a key, returning its value (if present) and the sibling
    /// hashes along the path
    pub fn get(&self, key: Fr) -> SmtResult<(Option<Fr>, Vec<Fr>)> {
        let walk = self.walk(key)?;
        let value = match walk.terminal {
            Node::Leaf { key: ek, value: ev } if ek == key => Some(ev),
            _ => None,
        };
        Ok((value, walk.siblings))
    }

    /// Generate an inclusion or exclusion proof for a key
    pub fn generate_proof(&self, key: Fr) -> SmtResult<Proof> {
        let walk = self.walk(key)?;

        let (existence, node_aux) = match walk.terminal {
            Node::Leaf { key: ek, value: ev } => {
                if ek == key {
                    (true, None)
                } else {
                    (false, Some(NodeAux { key: ek, value: ev }))
                }
            }
            _ => (false, None),
        };

        Ok(Proof {
            existence,
            siblings: walk.siblings,
            node_aux,
        })
    }

    /// Verify a proof against an arbitrary root
    pub fn verify_proof(root: Fr, proof: &Proof, key: Fr, value: Fr) -> bool {
        proof.verify(root, key, value)
    }

    /// Point the tree at a root, persisting the pointer
    ///
    /// Used both as the final step of every mutation and by the engine to
    /// restore a snapshot during rollback; the content-addressed node set
    /// keeps every historical root reachable.
    pub fn set_root(&mut self, root: Fr) -> SmtResult<()> {
        self.store.put(
            keys::tree_root_key(&self.tree_id).as_bytes(),
            &fr_to_le_bytes(&root),
        )?;
        self.root = root;
        Ok(())
    }

    fn add_at(
        &self,
        node_hash: Fr,
        key: Fr,
        value: Fr,
        level: usize,
        batch: &mut Vec<(Fr, Node)>,
    ) -> SmtResult<Fr> {
        if level >= self.depth {
            return Err(SmtError::DepthExceeded(self.depth));
        }

        match self.load_node(&node_hash)? {
            Node::Empty => {
                let leaf = Node::Leaf { key, value };
                let hash = leaf.hash()?;
                batch.push((hash, leaf));
                Ok(hash)
            }
            Node::Leaf { key: ek, value: ev } => {
                if ek == key {
                    return Err(SmtError::KeyExists);
                }
                self.extend_leaf(ek, ev, key, value, level, batch)
            }
            Node::Middle { left, right } => {
                let node = if fr_bit(&key, level) {
                    let new_right = self.add_at(right, key, value, level + 1, batch)?;
                    Node::Middle {
                        left,
                        right: new_right,
                    }
                } else {
                    let new_left = self.add_at(left, key, value, level + 1, batch)?;
                    Node::Middle {
                        left: new_left,
                        right,
                    }
                };
                let hash = node.hash()?;
                batch.push((hash, node));
                Ok(hash)
            }
        }
    }

    /// Split a leaf that shares a path prefix with the new key
    ///
    /// Descends until the first differing bit, at most `depth` levels.
    fn extend_leaf(
        &self,
        old_key: Fr,
        old_value: Fr,
        new_key: Fr,
        new_value: Fr,
        level: usize,
        batch: &mut Vec<(Fr, Node)>,
    ) -> SmtResult<Fr> {
        if level >= self.depth {
            return Err(SmtError::DepthExceeded(self.depth));
        }

        let new_bit = fr_bit(&new_key, level);
        if new_bit == fr_bit(&old_key, level) {
            let child = self.extend_leaf(old_key, old_value, new_key, new_value, level + 1, batch)?;
            let node = if new_bit {
                Node::Middle {
                    left: Fr::zero(),
                    right: child,
                }
            } else {
                Node::Middle {
                    left: child,
                    right: Fr::zero(),
                }
            };
            let hash = node.hash()?;
            batch.push((hash, node));
            return Ok(hash);
        }

        let old_leaf = Node::Leaf {
            key: old_key,
            value: old_value,
        };
        let old_hash = old_leaf.hash()?;
        batch.push((old_hash, old_leaf));

        let new_leaf = Node::Leaf {
            key: new_key,
            value: new_value,
        };
        let new_hash = new_leaf.hash()?;
        batch.push((new_hash, new_leaf));

        let node = if new_bit {
            Node::Middle {
                left: old_hash,
                right: new_hash,
            }
        } else {
            Node::Middle {
                left: new_hash,
                right: old_hash,
            }
        };
        let hash = node.hash()?;
        batch.push((hash, node));
        Ok(hash)
    }

    fn walk(&self, key: Fr) -> SmtResult<Walk> {
        let mut siblings = Vec::new();
        let mut current = self.root;
        let mut level = 0usize;

        loop {
            let node = self.load_node(&current)?;
            match node {
                Node::Middle { left, right } => {
                    if level >= self.depth {
                        return Err(SmtError::DepthExceeded(self.depth));
                    }
                    if fr_bit(&key, level) {
                        siblings.push(left);
                        current = right;
                    } else {
                        siblings.push(right);
                        current = left;
                    }
                    level += 1;
                }
                terminal => {
                    return Ok(Walk { siblings, terminal });
                }
            }
        }
    }

    fn load_node(&self, hash: &Fr) -> SmtResult<Node> {
        if hash.is_zero() {
            return Ok(Node::Empty);
        }

        let key = keys::tree_node_key(&self.tree_id, &fr_to_hex(hash));
        match self.store.get(key.as_bytes())? {
            Some(bytes) => Node::from_bytes(&bytes),
            None => Err(SmtError::CorruptNode(format!(
                "dangling node reference {}",
                fr_to_hex(hash)
            ))),
        }
    }

    fn flush(&self, batch: &[(Fr, Node)]) -> SmtResult<()> {
        for (hash, node) in batch {
            let key = keys::tree_node_key(&self.tree_id, &fr_to_hex(hash));
            self.store.put(key.as_bytes(), &node.to_bytes())?;
        }
        Ok(())
    }
}

struct Walk {
    siblings: Vec<Fr>,
    terminal: Node,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_store::MemStore;

    fn tree(depth: usize) -> SparseMerkleTree {
        SparseMerkleTree::open(Arc::new(MemStore::new()), "test", depth).unwrap()
    }

    #[test]
    fn test_add_and_get() {
        let mut t = tree(40);
        t.add(Fr::from(1u64), Fr::from(10u64)).unwrap();
        t.add(Fr::from(2u64), Fr::from(20u64)).unwrap();

        assert_eq!(t.get(Fr::from(1u64)).unwrap().0, Some(Fr::from(10u64)));
        assert_eq!(t.get(Fr::from(2u64)).unwrap().0, Some(Fr::from(20u64)));
        assert_eq!(t.get(Fr::from(3u64)).unwrap().0, None);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut t = tree(40);
        t.add(Fr::from(1u64), Fr::from(10u64)).unwrap();

        let root_before = t.root();
        assert!(matches!(
            t.add(Fr::from(1u64), Fr::from(99u64)),
            Err(SmtError::KeyExists)
        ));
        assert_eq!(t.root(), root_before);
    }

    #[test]
    fn test_update_existing() {
        let mut t = tree(40);
        t.add(Fr::from(7u64), Fr::from(1u64)).unwrap();

        let old = t.update(Fr::from(7u64), Fr::from(2u64)).unwrap();
        assert_eq!(old, Fr::from(1u64));
        assert_eq!(t.get(Fr::from(7u64)).unwrap().0, Some(Fr::from(2u64)));
    }

    #[test]
    fn test_update_missing() {
        let mut t = tree(40);
        assert!(matches!(
            t.update(Fr::from(7u64), Fr::from(2u64)),
            Err(SmtError::KeyNotFound)
        ));
    }

    #[test]
    fn test_inclusion_proof_verifies() {
        let mut t = tree(40);
        for i in 1u64..20 {
            t.add(Fr::from(i), Fr::from(i * 100)).unwrap();
        }

        for i in 1u64..20 {
            let proof = t.generate_proof(Fr::from(i)).unwrap();
            assert!(proof.existence);
            assert!(proof.verify(t.root(), Fr::from(i), Fr::from(i * 100)));
            // Wrong value must not verify
            assert!(!proof.verify(t.root(), Fr::from(i), Fr::from(i * 100 + 1)));
        }
    }

    #[test]
    fn test_exclusion_proof_verifies() {
        let mut t = tree(40);
        for i in 1u64..10 {
            t.add(Fr::from(i), Fr::from(i)).unwrap();
        }

        let absent = Fr::from(1000u64);
        let proof = t.generate_proof(absent).unwrap();
        assert!(!proof.existence);
        assert!(proof.verify(t.root(), absent, Fr::zero()));
    }

    #[test]
    fn test_exclusion_proof_with_occupying_leaf() {
        let mut t = tree(40);
        // 1 and 1 + 2^20 share the 20 low-order bits; inserting only the
        // first leaves the second's path terminating at that leaf.
        t.add(Fr::from(1u64), Fr::from(5u64)).unwrap();

        let absent = Fr::from(1u64 + (1u64 << 20));
        let proof = t.generate_proof(absent).unwrap();
        assert!(!proof.existence);
        assert!(proof.node_aux.is_some());
        assert!(proof.verify(t.root(), absent, Fr::zero()));
    }

    #[test]
    fn test_insertion_order_independent_root() {
        let entries: Vec<(Fr, Fr)> = (1u64..12).map(|i| (Fr::from(i * 7), Fr::from(i))).collect();

        let mut a = tree(40);
        for (k, v) in &entries {
            a.add(*k, *v).unwrap();
        }

        let mut b = tree(40);
        for (k, v) in entries.iter().rev() {
            b.add(*k, *v).unwrap();
        }

        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_depth_exceeded() {
        let mut t = tree(40);
        // Keys differing only above bit 40 collide on the full path.
        t.add(Fr::from(1u64), Fr::from(1u64)).unwrap();
        assert!(matches!(
            t.add(Fr::from(1u64 + (1u64 << 40)), Fr::from(2u64)),
            Err(SmtError::DepthExceeded(40))
        ));
    }

    #[test]
    fn test_persisted_root_survives_reopen() {
        let store = Arc::new(MemStore::new());

        let root = {
            let mut t = SparseMerkleTree::open(store.clone(), "claims", 40).unwrap();
            t.add(Fr::from(1u64), Fr::from(2u64)).unwrap();
            t.root()
        };

        let reopened = SparseMerkleTree::open(store, "claims", 40).unwrap();
        assert_eq!(reopened.root(), root);
        assert_eq!(reopened.get(Fr::from(1u64)).unwrap().0, Some(Fr::from(2u64)));
    }

    #[test]
    fn test_set_root_restores_history() {
        let mut t = tree(40);
        t.add(Fr::from(1u64), Fr::from(1u64)).unwrap();
        let snapshot = t.root();

        t.add(Fr::from(2u64), Fr::from(2u64)).unwrap();
        assert_ne!(t.root(), snapshot);

        // Nodes are content-addressed, so the old root stays readable.
        t.set_root(snapshot).unwrap();
        assert_eq!(t.get(Fr::from(1u64)).unwrap().0, Some(Fr::from(1u64)));
        assert_eq!(t.get(Fr::from(2u64)).unwrap().0, None);
    }
}
