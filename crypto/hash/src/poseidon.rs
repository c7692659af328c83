//! Fixed-width Poseidon permutation
//!
//! One permutation instance per arity: hashing `n` inputs uses state width
//! `t = n + 1`, initial state `[0, in_0, .., in_{n-1}]`, and returns
//! `state[0]` after the permutation. S-box is `x^5`, with 8 full rounds and
//! a per-width partial round count.
//!
//! Round constants and the MDS matrix are generated deterministically from
//! the width; the Cauchy construction keeps the matrix maximally
//! distance-separating over the prime field.

use ark_bn254::Fr;
use ark_ff::Field;
use once_cell::sync::Lazy;

use crate::{HashError, HashResult};

/// Maximum number of hash inputs
pub const MAX_INPUTS: usize = 16;

/// Full rounds (split half before, half after the partial rounds)
const FULL_ROUNDS: usize = 8;

/// Partial rounds for widths 2..=17
const PARTIAL_ROUNDS: [usize; 16] = [
    56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68,
];

/// Parameters of one fixed-width instance
struct PoseidonParams {
    t: usize,
    rounds_p: usize,
    ark: Vec<Vec<Fr>>,
    mds: Vec<Vec<Fr>>,
}

impl PoseidonParams {
    /// Generate parameters for state width `t`
    fn generate(t: usize) -> Self {
        let rounds_p = PARTIAL_ROUNDS[t - 2];
        let rounds = FULL_ROUNDS + rounds_p;

        let ark: Vec<Vec<Fr>> = (0..rounds)
            .map(|round| {
                (0..t)
                    .map(|i| {
                        let seed = ((round * t + i) as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
                        Fr::from(seed)
                    })
                    .collect()
            })
            .collect();

        // Cauchy matrix: mds[i][j] = 1 / (x_i + y_j) with disjoint x and y
        let mds: Vec<Vec<Fr>> = (0..t)
            .map(|i| {
                (0..t)
                    .map(|j| {
                        let x = Fr::from(i as u64);
                        let y = Fr::from((t + j) as u64);
                        (x + y).inverse().unwrap_or_else(|| Fr::from(1u64))
                    })
                    .collect()
            })
            .collect();

        Self { t, rounds_p, ark, mds }
    }

    /// Apply the permutation in place
    fn permute(&self, state: &mut [Fr]) {
        let half_full = FULL_ROUNDS / 2;
        let rounds = FULL_ROUNDS + self.rounds_p;

        for round in 0..rounds {
            for (i, s) in state.iter_mut().enumerate() {
                *s += self.ark[round][i];
            }

            let full = round < half_full || round >= half_full + self.rounds_p;
            if full {
                for s in state.iter_mut() {
                    *s = sbox(*s);
                }
            } else {
                state[0] = sbox(state[0]);
            }

            let mut mixed = vec![Fr::from(0u64); self.t];
            for (i, row) in self.mds.iter().enumerate() {
                for (j, m) in row.iter().enumerate() {
                    mixed[i] += *m * state[j];
                }
            }
            state.copy_from_slice(&mixed);
        }
    }
}

#[inline]
fn sbox(x: Fr) -> Fr {
    let x2 = x * x;
    x2 * x2 * x
}

/// Lazily built instances for widths 2..=17
static PARAMS: Lazy<Vec<PoseidonParams>> =
    Lazy::new(|| (2..=MAX_INPUTS + 1).map(PoseidonParams::generate).collect());

/// Hash 1..=16 field elements to one
pub fn poseidon_hash(inputs: &[Fr]) -> HashResult<Fr> {
    if inputs.is_empty() || inputs.len() > MAX_INPUTS {
        return Err(HashError::DomainOverflow(inputs.len()));
    }

    let params = &PARAMS[inputs.len() - 1];

    let mut state = vec![Fr::from(0u64); params.t];
    state[1..].copy_from_slice(inputs);
    params.permute(&mut state);

    Ok(state[0])
}
