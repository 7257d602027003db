//! Decorative word field rendered behind the capture screens.
//!
//! Picks a random subset of a static sketch vocabulary and places each word
//! at a random fractional position with a random size and animation
//! duration. Randomness goes through the [`RandomSource`] trait so layout
//! logic is deterministic under test; the production source is a small
//! seeded generator (none of our dependencies pull in an RNG crate).

/// Static sketch vocabulary the field samples from.
pub const WORDS: &[&str] = &[
    "airplane", "alarm clock", "angel", "ant", "apple", "arm", "armchair", "ashtray", "axe",
    "backpack", "banana", "barn", "baseball bat", "basket", "bathtub", "bear (animal)", "bed",
    "bee", "beer-mug", "bell", "bench", "bicycle", "binoculars", "blimp", "book", "bookshelf",
    "boomerang", "bottle opener", "bowl", "brain", "bread", "bridge", "bulldozer", "bus", "bush",
    "butterfly", "cabinet", "cactus", "cake", "calculator", "camel", "camera", "candle", "cannon",
    "canoe", "car (sedan)", "carrot", "castle", "cat", "cell phone", "chair", "chandelier",
    "church", "cigarette", "cloud", "comb", "computer monitor", "computer-mouse", "couch", "cow",
    "crab", "crane (machine)", "crocodile", "crown", "cup", "diamond", "dog", "dolphin", "donut",
    "door", "door handle", "dragon", "duck", "ear", "elephant", "envelope", "eye", "eyeglasses",
    "face", "fan", "feather", "fire hydrant", "fish", "flashlight", "floor lamp",
    "flower with stem", "flying bird", "flying saucer", "foot", "fork", "frog", "frying-pan",
    "giraffe", "grapes", "grenade", "guitar", "hamburger", "hammer", "hand", "harp", "hat",
    "head", "head-phones", "hedgehog", "helicopter", "helmet", "horse", "hot air balloon",
    "hot-dog", "hourglass", "house", "human-skeleton", "ice-cream-cone", "ipod", "kangaroo",
    "key", "keyboard", "knife", "ladder", "laptop", "leaf", "lightbulb", "lighter", "lion",
    "lobster", "loudspeaker", "mailbox", "megaphone", "mermaid", "microphone", "microscope",
    "monkey", "moon", "mosquito", "motorbike", "mouse (animal)", "mouth", "mug", "mushroom",
    "nose", "octopus", "owl", "palm tree", "panda", "paper clip", "parachute", "parking meter",
    "parrot", "pear", "pen", "penguin", "person sitting", "person walking", "piano",
    "pickup truck", "pig", "pigeon", "pineapple", "pipe (for smoking)", "pizza", "potted plant",
    "power outlet", "present", "pretzel", "pumpkin", "purse", "rabbit", "race car", "radio",
    "rainbow", "revolver", "rifle", "rollerblades", "rooster", "sailboat", "santa claus",
    "satellite", "satellite dish", "saxophone", "scissors", "scorpion", "screwdriver",
    "sea turtle", "seagull", "shark", "sheep", "ship", "shoe", "shovel", "skateboard", "skull",
    "skyscraper", "snail", "snake", "snowboard", "snowman", "socks", "space shuttle",
    "speed-boat", "spider", "sponge bob", "spoon", "squirrel", "standing bird", "stapler",
    "strawberry", "streetlight", "submarine", "suitcase", "sun", "suv", "swan", "sword",
    "syringe", "t-shirt", "table", "tablelamp", "teacup", "teapot", "teddy-bear", "telephone",
    "tennis-racket", "tent", "tiger", "tire", "toilet", "tomato", "tooth", "toothbrush",
    "tractor", "traffic light", "train", "tree", "trombone", "trousers", "truck", "trumpet",
    "tv", "umbrella", "van", "vase", "violin", "walkie talkie", "wheel", "wheelbarrow",
    "windmill", "zebra",
];

/// Number of words shown when the config does not override it.
pub const DEFAULT_VISIBLE_COUNT: usize = 50;

/// Injectable randomness for layout generation.
pub trait RandomSource {
    fn next_u64(&mut self) -> u64;

    /// Uniform in `[0, 1)`.
    fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform in `[0, upper)`; `upper` must be nonzero.
    fn next_index(&mut self, upper: usize) -> usize {
        (self.next_u64() % upper as u64) as usize
    }
}

/// splitmix64 generator, the default [`RandomSource`].
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeds from the system clock.
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() as u64 ^ d.as_secs())
            .unwrap_or(0x9e3779b97f4a7c15);
        Self::new(nanos)
    }
}

impl RandomSource for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }
}

/// One placed word of the field.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub text: &'static str,
    /// Horizontal position as a fraction of the container width, `[0, 1)`
    pub left: f32,
    /// Vertical position as a fraction of the container height, `[0, 1)`
    pub top: f32,
    /// Font size in pixels, `[12, 36)`
    pub font_px: f32,
    /// Animation duration in seconds, `[5, 15)`
    pub duration_secs: f32,
}

/// A randomized layout of vocabulary words, regenerated once per mount.
pub struct WordField {
    words: Vec<PlacedWord>,
}

impl WordField {
    /// Shuffles the vocabulary and places `count` words at random positions,
    /// sizes and durations. `count` is clamped to the vocabulary size.
    pub fn generate(count: usize, rng: &mut impl RandomSource) -> Self {
        let mut indices: Vec<usize> = (0..WORDS.len()).collect();

        // Fisher-Yates
        for i in (1..indices.len()).rev() {
            let j = rng.next_index(i + 1);
            indices.swap(i, j);
        }

        let words = indices
            .into_iter()
            .take(count.min(WORDS.len()))
            .map(|index| PlacedWord {
                text: WORDS[index],
                left: rng.next_f32(),
                top: rng.next_f32(),
                font_px: 12.0 + rng.next_f32() * 24.0,
                duration_secs: 5.0 + rng.next_f32() * 10.0,
            })
            .collect();

        Self { words }
    }

    pub fn words(&self) -> &[PlacedWord] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_the_requested_count() {
        let mut rng = SplitMix64::new(1);
        let field = WordField::generate(DEFAULT_VISIBLE_COUNT, &mut rng);
        assert_eq!(field.len(), 50);

        let mut rng = SplitMix64::new(1);
        let oversized = WordField::generate(10_000, &mut rng);
        assert_eq!(oversized.len(), WORDS.len());
    }

    #[test]
    fn test_layout_values_stay_in_range() {
        let mut rng = SplitMix64::new(42);
        let field = WordField::generate(100, &mut rng);

        for word in field.words() {
            assert!((0.0..1.0).contains(&word.left));
            assert!((0.0..1.0).contains(&word.top));
            assert!((12.0..36.0).contains(&word.font_px));
            assert!((5.0..15.0).contains(&word.duration_secs));
        }
    }

    #[test]
    fn test_no_word_repeats_within_a_field() {
        let mut rng = SplitMix64::new(7);
        let field = WordField::generate(WORDS.len(), &mut rng);

        let mut seen: Vec<&str> = field.words().iter().map(|w| w.text).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), WORDS.len());
    }

    #[test]
    fn test_same_seed_reproduces_the_layout() {
        let mut a = SplitMix64::new(99);
        let mut b = SplitMix64::new(99);
        assert_eq!(
            WordField::generate(20, &mut a).words(),
            WordField::generate(20, &mut b).words()
        );
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = SplitMix64::new(1);
        let mut b = SplitMix64::new(2);
        assert_ne!(
            WordField::generate(20, &mut a).words(),
            WordField::generate(20, &mut b).words()
        );
    }
}
