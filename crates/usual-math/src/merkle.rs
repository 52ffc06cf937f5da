//! BLAKE3 Merkle trees with commutative pair hashing.
//!
//! Parent nodes hash the concatenation of the *sorted* child pair, so a proof
//! is just the sibling path with no index bookkeeping. Odd nodes are promoted
//! to the next level unchanged.

/// Hash data using BLAKE3 (256-bit output)
pub fn hash_blake3(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash a node pair in sorted order
pub fn hash_pair(a: &[u8; 32], b: &[u8; 32]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    if a <= b {
        hasher.update(a);
        hasher.update(b);
    } else {
        hasher.update(b);
        hasher.update(a);
    }
    *hasher.finalize().as_bytes()
}

/// Compute Merkle root from leaves
pub fn compute_root(leaves: &[[u8; 32]]) -> [u8; 32] {
    if leaves.is_empty() {
        return [0u8; 32];
    }

    let mut current_level = leaves.to_vec();

    while current_level.len() > 1 {
        let mut next_level = Vec::with_capacity(current_level.len().div_ceil(2));

        for chunk in current_level.chunks(2) {
            if chunk.len() == 2 {
                next_level.push(hash_pair(&chunk[0], &chunk[1]));
            } else {
                next_level.push(chunk[0]);
            }
        }

        current_level = next_level;
    }

    current_level[0]
}

/// Generate Merkle proof for a leaf at given index
pub fn generate_proof(leaves: &[[u8; 32]], index: usize) -> Vec<[u8; 32]> {
    if leaves.is_empty() || index >= leaves.len() {
        return Vec::new();
    }

    let mut proof = Vec::new();
    let mut current_level = leaves.to_vec();
    let mut current_index = index;

    while current_level.len() > 1 {
        let sibling_index = if current_index % 2 == 0 {
            current_index + 1
        } else {
            current_index - 1
        };

        if sibling_index < current_level.len() {
            proof.push(current_level[sibling_index]);
        }

        let mut next_level = Vec::with_capacity(current_level.len().div_ceil(2));
        for chunk in current_level.chunks(2) {
            if chunk.len() == 2 {
                next_level.push(hash_pair(&chunk[0], &chunk[1]));
            } else {
                next_level.push(chunk[0]);
            }
        }

        current_level = next_level;
        current_index /= 2;
    }

    proof
}

/// Verify a Merkle proof against a root
pub fn verify_proof(leaf: [u8; 32], proof: &[[u8; 32]], root: [u8; 32]) -> bool {
    let mut current = leaf;

    for sibling in proof {
        current = hash_pair(&current, sibling);
    }

    current == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    fn random_leaves(count: usize, seed: u64) -> Vec<[u8; 32]> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let mut leaf = [0u8; 32];
                rng.fill(&mut leaf);
                leaf
            })
            .collect()
    }

    #[test]
    fn test_root_deterministic() {
        let leaves = random_leaves(7, 42);

        let root = compute_root(&leaves);
        let root2 = compute_root(&leaves);

        assert_eq!(root, root2);
        assert_ne!(root, [0u8; 32]);
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(compute_root(&[]), [0u8; 32]);

        let leaf = hash_blake3(b"only");
        assert_eq!(compute_root(&[leaf]), leaf);
    }

    #[test]
    fn test_pair_hash_commutative() {
        let a = hash_blake3(b"a");
        let b = hash_blake3(b"b");
        assert_eq!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn test_proof_roundtrip_all_indices() {
        // Odd leaf counts exercise the promoted-node path.
        for count in [1usize, 2, 3, 5, 8, 13] {
            let leaves = random_leaves(count, count as u64);
            let root = compute_root(&leaves);

            for (i, leaf) in leaves.iter().enumerate() {
                let proof = generate_proof(&leaves, i);
                assert!(verify_proof(*leaf, &proof, root), "count={count} index={i}");
            }
        }
    }

    #[test]
    fn test_wrong_leaf_rejected() {
        let leaves = random_leaves(8, 7);
        let root = compute_root(&leaves);
        let proof = generate_proof(&leaves, 3);

        assert!(!verify_proof(hash_blake3(b"forged"), &proof, root));
    }

    #[test]
    fn test_tampered_proof_rejected() {
        let leaves = random_leaves(8, 9);
        let root = compute_root(&leaves);
        let mut proof = generate_proof(&leaves, 2);
        proof[0][0] ^= 0xFF;

        assert!(!verify_proof(leaves[2], &proof, root));
    }
}
