//! Draw odds for the deck panel
//!
//! Hypergeometric "at least one copy in the next k draws", with an optional
//! reshuffle of the discard pile once the draw pile runs dry.

/// Binomial coefficient, multiplicative form. Exact for deck-sized inputs.
pub fn n_choose_k(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (1..=k).fold(1.0, |acc, i| acc * f64::from(n - k + i) / f64::from(i))
}

/// Chance of drawing at least one of `copies` in `draws` cards from a pile of
/// `pile` cards, without reshuffling.
pub fn prob_at_least_one(pile: u32, copies: u32, draws: u32) -> f64 {
    if copies == 0 || draws == 0 {
        return 0.0;
    }
    if draws >= pile || copies >= pile {
        return 1.0;
    }
    let total = n_choose_k(pile, draws);
    if total == 0.0 {
        return 0.0;
    }
    1.0 - n_choose_k(pile - copies, draws) / total
}

/// Like [`prob_at_least_one`], but once the draw pile is exhausted the
/// remaining draws come from the reshuffled discard pile.
pub fn prob_with_reshuffle(
    pile: u32,
    copies_in_pile: u32,
    discard: u32,
    copies_in_discard: u32,
    draws: u32,
) -> f64 {
    let total_copies = copies_in_pile + copies_in_discard;
    if total_copies == 0 || draws == 0 {
        return 0.0;
    }
    if draws >= pile + discard {
        return 1.0;
    }
    if draws <= pile {
        return prob_at_least_one(pile, copies_in_pile, draws);
    }
    let from_discard = draws - pile;
    let none_in_pile = if pile == 0 {
        1.0
    } else {
        1.0 - prob_at_least_one(pile, copies_in_pile, pile)
    };
    let none_in_discard = if discard == 0 {
        1.0
    } else {
        1.0 - prob_at_least_one(discard, copies_in_discard, from_discard)
    };
    1.0 - none_in_pile * none_in_discard
}
