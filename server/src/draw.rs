//! Number-draw generation: each draw is an arithmetic puzzle whose result
//! is a not-yet-drawn number in `[1, 75]`.

use rand::Rng;
use shared::{
    Calculation, Operator, DIRECT_PICK_THRESHOLD, MAX_DRAW_ATTEMPTS, MAX_NUMBER, MIN_NUMBER,
};
use std::sync::OnceLock;

/// Discrete operator distribution. Five equally likely slots, two of them
/// addition, so the draw leans toward easy sums.
const OPERATOR_WEIGHTS: [(Operator, u32); 4] = [
    (Operator::Add, 2),
    (Operator::Subtract, 1),
    (Operator::Multiply, 1),
    (Operator::Divide, 1),
];

static DIVISION_TRIPLES: OnceLock<Vec<Calculation>> = OnceLock::new();

/// Every `(x, z, x / z)` with `x, z` in `[1, 75]`, `z | x` and the quotient
/// in `[1, 75]`. Built once per process; division attempts pick uniformly
/// from this table.
pub fn division_triples() -> &'static [Calculation] {
    DIVISION_TRIPLES.get_or_init(|| {
        let mut triples = Vec::new();
        for x in MIN_NUMBER..=MAX_NUMBER {
            for z in MIN_NUMBER..=MAX_NUMBER {
                if x % z == 0 {
                    let result = x / z;
                    if (MIN_NUMBER..=MAX_NUMBER).contains(&result) {
                        triples.push(Calculation {
                            x,
                            operator: Operator::Divide,
                            z,
                            result,
                        });
                    }
                }
            }
        }
        triples
    })
}

/// Samples an operator from [`OPERATOR_WEIGHTS`].
fn sample_operator(rng: &mut impl Rng) -> Operator {
    let total: u32 = OPERATOR_WEIGHTS.iter().map(|(_, weight)| weight).sum();
    let mut roll = rng.gen_range(0..total);
    for (operator, weight) in OPERATOR_WEIGHTS {
        if roll < weight {
            return operator;
        }
        roll -= weight;
    }
    // Weights sum to `total`, so the loop always returns.
    OPERATOR_WEIGHTS[OPERATOR_WEIGHTS.len() - 1].0
}

/// A direct pick dressed up as `0 + n = n`, used when few numbers remain.
fn endgame_pick(num: u32) -> Calculation {
    Calculation {
        x: 0,
        operator: Operator::Add,
        z: num,
        result: num,
    }
}

/// A direct pick dressed up as `n + 0 = n`, used when puzzle synthesis
/// gives up.
fn fallback_pick(num: u32) -> Calculation {
    Calculation {
        x: num,
        operator: Operator::Add,
        z: 0,
        result: num,
    }
}

/// Produces the next draw given the numbers already drawn, or `None` once
/// all 75 are out.
///
/// With more than [`DIRECT_PICK_THRESHOLD`] numbers remaining it makes up
/// to [`MAX_DRAW_ATTEMPTS`] attempts to synthesize a puzzle expression with
/// an unused result, then falls back to a direct pick. With the pool at or
/// below the threshold it picks directly, so the generator never starves
/// near the end of a game. The result is always in `[1, 75]` and never a
/// repeat of `picked`.
pub fn generate(picked: &[u32], rng: &mut impl Rng) -> Option<Calculation> {
    let mut drawn = [false; (MAX_NUMBER + 1) as usize];
    for &n in picked {
        if (MIN_NUMBER..=MAX_NUMBER).contains(&n) {
            drawn[n as usize] = true;
        }
    }

    let remaining: Vec<u32> = (MIN_NUMBER..=MAX_NUMBER)
        .filter(|&n| !drawn[n as usize])
        .collect();
    if remaining.is_empty() {
        return None;
    }

    if remaining.len() <= DIRECT_PICK_THRESHOLD {
        return Some(endgame_pick(remaining[rng.gen_range(0..remaining.len())]));
    }

    for _ in 0..MAX_DRAW_ATTEMPTS {
        let operator = sample_operator(rng);
        let candidate = match operator {
            Operator::Add => {
                let x = rng.gen_range(1..=37);
                let z = rng.gen_range(1..=37);
                Calculation {
                    x,
                    operator,
                    z,
                    result: x + z,
                }
            }
            Operator::Subtract => {
                let x = rng.gen_range(MIN_NUMBER..=MAX_NUMBER);
                // When x = 1 the upper bound collapses and z degenerates to
                // 1, making the result 0; the range check below rejects it.
                let upper = (x - 1).min(74);
                let z = if upper == 0 { 1 } else { rng.gen_range(1..=upper) };
                Calculation {
                    x,
                    operator,
                    z,
                    result: x - z,
                }
            }
            Operator::Multiply => {
                let x = rng.gen_range(1..=8);
                let z = rng.gen_range(1..=9);
                Calculation {
                    x,
                    operator,
                    z,
                    result: x * z,
                }
            }
            Operator::Divide => {
                let triples = division_triples();
                triples[rng.gen_range(0..triples.len())].clone()
            }
        };

        if (MIN_NUMBER..=MAX_NUMBER).contains(&candidate.result)
            && !drawn[candidate.result as usize]
        {
            return Some(candidate);
        }
    }

    Some(fallback_pick(remaining[rng.gen_range(0..remaining.len())]))
}
