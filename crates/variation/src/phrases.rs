//! Phrase bank for content variation. Randomized sub-phrases are seeded
//! into the `custom` context namespace before re-rendering, so templates
//! can reference `{{custom.greeting}}`, `{{custom.motivation}}`,
//! `{{custom.call_to_action}}`, and `{{custom.closing}}`.

use notify_core::types::{Language, TemplateContext};
use rand::seq::SliceRandom;
use rand::Rng;

pub struct PhraseBank {
    pub greetings: &'static [&'static str],
    pub motivational: &'static [&'static str],
    pub call_to_action: &'static [&'static str],
    pub closing: &'static [&'static str],
}

static EN_BANK: PhraseBank = PhraseBank {
    greetings: &["Hi", "Hello", "Hey there", "Welcome back", "Good to see you"],
    motivational: &[
        "You're making great progress",
        "Keep up the momentum",
        "Every session counts",
        "You're on a roll",
        "Small steps, big results",
    ],
    call_to_action: &[
        "Jump back in",
        "Continue where you left off",
        "Take a look",
        "See what's new",
        "Get started now",
    ],
    closing: &["See you soon", "Until next time", "Happy learning", "Talk soon", "Cheers"],
};

static FA_BANK: PhraseBank = PhraseBank {
    greetings: &["سلام", "درود", "وقت بخیر", "خوش آمدید", "سلام دوباره"],
    motivational: &[
        "پیشرفت خوبی داشته‌اید",
        "همین روند را ادامه دهید",
        "هر جلسه اهمیت دارد",
        "عالی پیش می‌روید",
        "قدم‌های کوچک، نتایج بزرگ",
    ],
    call_to_action: &[
        "ادامه دهید",
        "از همان‌جا که بودید ادامه دهید",
        "نگاهی بیندازید",
        "تازه‌ها را ببینید",
        "همین حالا شروع کنید",
    ],
    closing: &["به امید دیدار", "تا بعد", "موفق باشید", "به زودی", "روز خوبی داشته باشید"],
};

pub fn phrase_bank(language: Language) -> &'static PhraseBank {
    match language {
        Language::En => &EN_BANK,
        Language::Fa => &FA_BANK,
    }
}

/// Seed one random phrase per slot into the `custom` namespace. Returns a
/// short tag describing the chosen combination, stored as the history
/// entry's variation tag.
pub fn apply_random_phrases<R: Rng>(
    context: &mut TemplateContext,
    language: Language,
    rng: &mut R,
) -> String {
    let bank = phrase_bank(language);
    let slots = [
        ("greeting", bank.greetings),
        ("motivation", bank.motivational),
        ("call_to_action", bank.call_to_action),
        ("closing", bank.closing),
    ];

    let mut picks = Vec::with_capacity(slots.len());
    for (key, phrases) in slots {
        if let Some(phrase) = phrases.choose(rng) {
            context
                .custom
                .insert(key.to_string(), serde_json::json!(phrase));
            picks.push(format!(
                "{}:{}",
                key,
                phrases.iter().position(|p| p == phrase).unwrap_or(0)
            ));
        }
    }
    picks.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_apply_fills_all_slots() {
        let mut ctx = TemplateContext::default();
        let mut rng = StdRng::seed_from_u64(7);
        let tag = apply_random_phrases(&mut ctx, Language::En, &mut rng);

        for key in ["greeting", "motivation", "call_to_action", "closing"] {
            assert!(ctx.custom.contains_key(key), "missing slot {}", key);
        }
        assert_eq!(tag.split(',').count(), 4);
    }

    #[test]
    fn test_same_seed_same_phrases() {
        let mut a = TemplateContext::default();
        let mut b = TemplateContext::default();
        apply_random_phrases(&mut a, Language::Fa, &mut StdRng::seed_from_u64(42));
        apply_random_phrases(&mut b, Language::Fa, &mut StdRng::seed_from_u64(42));
        assert_eq!(a.custom.get("greeting"), b.custom.get("greeting"));
        assert_eq!(a.custom.get("closing"), b.custom.get("closing"));
    }
}
