//! Synthetic policy corpus for the auto-fit fallback.
//!
//! Template sentences filled from fixed word lists with a seeded RNG, so two
//! auto-fits with the same seed produce the same vocabulary. Text produced
//! here is never treated as real policy data.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::rng::RngHierarchy;

const TEMPLATES: &[&str] = &[
    "{a} will impose a {rate}% tariff on {product} imports from {b} under HS code {hs}",
    "{a} announces {rate} percent duties on {product} from {b}, effective immediately",
    "Retaliatory tariffs of {rate}% on {b} {product} (heading {hs}) take effect next month",
    "{a} and {b} agree to reduce tariffs on {product} to {rate}% under a bilateral deal",
    "WTO members discuss a treaty capping duties on {product} at {rate} percent",
    "Emergency safeguard: {a} raises the rate of {rate} on {product} imports from {b}",
    "{a} extends exclusions for {product} (HS {hs}) from {b} pending review",
    "National security investigation into {product} imports may lead to {rate}% tariffs by {a}",
];

const COUNTRIES: &[&str] = &[
    "The United States",
    "China",
    "Mexico",
    "Canada",
    "Japan",
    "Germany",
    "The European Union",
    "India",
    "Vietnam",
    "South Korea",
];

const PRODUCTS: &[(&str, &str)] = &[
    ("steel", "7208"),
    ("aluminum", "7601"),
    ("semiconductor", "8542"),
    ("telecommunications equipment", "8517"),
    ("automobile", "8703"),
    ("solar panel", "8541"),
    ("soybean", "1201"),
    ("textile", "6109"),
    ("pharmaceutical", "3004"),
    ("computer", "8471"),
];

const RATES: &[u32] = &[5, 10, 15, 20, 25, 30, 35, 50, 100];

/// Generate `size` deterministic policy sentences.
pub fn generate_policy_corpus(rng: &RngHierarchy, size: usize) -> Vec<String> {
    let mut r = rng.rng_for("synthetic_policy_corpus", 0);
    (0..size)
        .map(|_| {
            let template = TEMPLATES[r.gen_range(0..TEMPLATES.len())];
            let mut pair: Vec<&str> = COUNTRIES.choose_multiple(&mut r, 2).copied().collect();
            let b = pair.pop().unwrap_or("China");
            let a = pair.pop().unwrap_or("The United States");
            let (product, hs) = PRODUCTS[r.gen_range(0..PRODUCTS.len())];
            let rate = RATES[r.gen_range(0..RATES.len())];
            template
                .replace("{a}", a)
                .replace("{b}", b.trim_start_matches("The "))
                .replace("{product}", product)
                .replace("{hs}", hs)
                .replace("{rate}", &rate.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_is_deterministic() {
        let a = generate_policy_corpus(&RngHierarchy::new(42), 20);
        let b = generate_policy_corpus(&RngHierarchy::new(42), 20);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
    }

    #[test]
    fn templates_fully_substituted() {
        for doc in generate_policy_corpus(&RngHierarchy::new(1), 50) {
            assert!(!doc.contains('{'), "unfilled template: {doc}");
        }
    }
}
