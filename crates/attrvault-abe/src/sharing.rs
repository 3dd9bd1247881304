//! Secret sharing over an access tree.
//!
//! Every gate `k of n` gets a random polynomial of degree `k - 1` whose
//! constant term is the gate's share; child `i` (1-based) receives the
//! polynomial evaluated at `i`. Leaves end up with one share each, listed in
//! depth-first order, matching [`AccessPolicy::literals`].
//!
//! Reconstruction is planned without touching the group: [`plan`] returns,
//! for a satisfying subset of leaves, the product of Lagrange coefficients
//! along each leaf's path. The root secret is then `sum(coef_i * share_i)`,
//! which the scheme evaluates in the exponent.

use rabe_bn::Fr;
use rand::Rng;

use attrvault_core::{AccessPolicy, Attribute};

use crate::group::{fr_from_u64, lagrange_at_zero};

/// Split `secret` over the policy tree. One share per leaf, depth-first.
pub(crate) fn share<R: Rng>(policy: &AccessPolicy, secret: Fr, rng: &mut R) -> Vec<Fr> {
    let mut out = Vec::with_capacity(policy.leaf_count());
    share_node(policy, secret, rng, &mut out);
    out
}

fn share_node<R: Rng>(node: &AccessPolicy, secret: Fr, rng: &mut R, out: &mut Vec<Fr>) {
    let Some((k, children)) = node.gate() else {
        out.push(secret);
        return;
    };

    let mut coefficients = Vec::with_capacity(k.min(children.len()));
    coefficients.push(secret);
    for _ in 1..k {
        coefficients.push(rng.gen::<Fr>());
    }

    for (i, child) in children.iter().enumerate() {
        let x = fr_from_u64(i as u64 + 1);
        share_node(child, evaluate(&coefficients, x), rng, out);
    }
}

/// Horner evaluation of a polynomial given lowest-degree coefficient first.
fn evaluate(coefficients: &[Fr], x: Fr) -> Fr {
    coefficients
        .iter()
        .rev()
        .fold(Fr::zero(), |acc, &c| acc * x + c)
}

/// Leaf index (depth-first) and its reconstruction coefficient.
pub(crate) type Plan = Vec<(usize, Fr)>;

/// Choose a satisfying set of leaves for a holder of `has`.
///
/// Returns `None` when the policy is not satisfied. Takes the first `k`
/// satisfied children of every gate.
pub(crate) fn plan<F>(policy: &AccessPolicy, has: F) -> Option<Plan>
where
    F: Fn(&Attribute) -> bool,
{
    let mut next_leaf = 0;
    plan_node(policy, &has, &mut next_leaf)
}

fn plan_node<F>(node: &AccessPolicy, has: &F, next_leaf: &mut usize) -> Option<Plan>
where
    F: Fn(&Attribute) -> bool,
{
    let (k, children) = match node {
        AccessPolicy::Leaf(attr) => {
            let index = *next_leaf;
            *next_leaf += 1;
            return has(attr).then(|| vec![(index, Fr::one())]);
        }
        _ => node.gate()?,
    };

    // Every child is visited so leaf numbering stays aligned.
    let mut satisfied: Vec<(u64, Plan)> = Vec::with_capacity(k.min(children.len()));
    for (i, child) in children.iter().enumerate() {
        if let Some(sub) = plan_node(child, has, next_leaf) {
            if satisfied.len() < k {
                satisfied.push((i as u64 + 1, sub));
            }
        }
    }

    if k == 0 || satisfied.len() < k {
        return None;
    }

    let xs: Vec<u64> = satisfied.iter().map(|(x, _)| *x).collect();
    let mut out = Vec::new();
    for (x, sub) in satisfied {
        let coef = lagrange_at_zero(x, &xs)?;
        out.extend(sub.into_iter().map(|(leaf, c)| (leaf, c * coef)));
    }
    Some(out)
}
