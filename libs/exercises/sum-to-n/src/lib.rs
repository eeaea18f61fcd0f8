//! Three ways to compute `1 + 2 + ... + n`.
//!
//! | Function | Time | Extra space |
//! |---|---|---|
//! | [`sum_to_n_loop`] | O(n) | O(1) |
//! | [`sum_to_n_recursive`] | O(n) | O(n) call stack |
//! | [`sum_to_n_formula`] | O(1) | O(1) |
//!
//! All three return `0` for `n = 0`. The plain versions panic on overflow
//! in debug builds like any integer arithmetic; the `checked_` versions
//! return `None` instead.

/// Add the numbers `1..=n` one by one.
pub fn sum_to_n_loop(n: u64) -> u64 {
    let mut sum = 0;
    for i in 1..=n {
        sum += i;
    }
    sum
}

/// `n + sum(n - 1)`, down to `sum(0) = 0`.
///
/// Recursion depth is `n`, so very large inputs exhaust the stack.
pub fn sum_to_n_recursive(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    n + sum_to_n_recursive(n - 1)
}

/// Gauss: `n * (n + 1) / 2`.
///
/// The even factor is halved before multiplying, so the result is exact
/// for every `n` whose sum fits in a `u64`.
pub fn sum_to_n_formula(n: u64) -> u64 {
    let (a, b) = halve_even(n, n + 1);
    a * b
}

pub fn checked_sum_to_n_loop(n: u64) -> Option<u64> {
    (1..=n).try_fold(0u64, |sum, i| sum.checked_add(i))
}

pub fn checked_sum_to_n_recursive(n: u64) -> Option<u64> {
    if n == 0 {
        return Some(0);
    }
    checked_sum_to_n_recursive(n - 1)?.checked_add(n)
}

pub fn checked_sum_to_n_formula(n: u64) -> Option<u64> {
    let (a, b) = halve_even(n, n.checked_add(1)?);
    a.checked_mul(b)
}

/// One of two consecutive integers is even; divide it by two.
fn halve_even(n: u64, m: u64) -> (u64, u64) {
    if n % 2 == 0 { (n / 2, m) } else { (n, m / 2) }
}
