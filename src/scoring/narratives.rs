//! Narrative table: the fixed interpretation text for each biorhythm score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Interpretation text for one score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub meaning: String,
    pub daily_impact: String,
    pub recommendations: String,
}

impl Narrative {
    fn new(meaning: &str, daily_impact: &str, recommendations: &str) -> Self {
        Self {
            meaning: meaning.to_string(),
            daily_impact: daily_impact.to_string(),
            recommendations: recommendations.to_string(),
        }
    }
}

/// Score → narrative lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrativeTable {
    entries: BTreeMap<i32, Narrative>,
}

impl NarrativeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, score: i32, narrative: Narrative) {
        self.entries.insert(score, narrative);
    }

    pub fn get(&self, score: i32) -> Option<&Narrative> {
        self.entries.get(&score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The nine biorhythm interpretations, keyed 1 through 9.
    pub fn biorhythm() -> Self {
        let mut table = Self::new();
        table.insert(
            1,
            Narrative::new(
                "A new cycle is beginning. Your dream mind is quiet and gathering energy.",
                "Expect lower recall and a slower start. Motivation may take time to build.",
                "Keep a notebook by the bed, go to sleep early, and be gentle with yourself.",
            ),
        );
        table.insert(
            2,
            Narrative::new(
                "Your dreams are turning toward relationships and the people close to you.",
                "You may feel more sensitive to others' moods and more open to cooperation.",
                "Share a dream with someone you trust and note which people keep reappearing.",
            ),
        );
        table.insert(
            3,
            Narrative::new(
                "Creative energy is rising. Dreams are vivid, playful and full of images.",
                "Ideas come easily today, though focus can scatter.",
                "Sketch or write down images right after waking before they fade.",
            ),
        );
        table.insert(
            4,
            Narrative::new(
                "A grounding phase. Dreams revisit familiar places and routines.",
                "A good day for structure, planning and finishing what you started.",
                "Keep a regular bedtime and look for repeating settings in your journal.",
            ),
        );
        table.insert(
            5,
            Narrative::new(
                "Change is in the air. Dreams feature travel, movement and open roads.",
                "You may feel restless and drawn to try something new.",
                "Welcome small changes in your routine and note dreams about journeys.",
            ),
        );
        table.insert(
            6,
            Narrative::new(
                "Your dreams centre on care, home and emotional balance.",
                "Responsibilities toward family and friends feel more important today.",
                "Make your bedroom calm and tidy, and wind down without screens.",
            ),
        );
        table.insert(
            7,
            Narrative::new(
                "A reflective, inward phase. Dreams are symbolic and sometimes puzzling.",
                "You may prefer solitude and deeper thinking over busy plans.",
                "Try a short meditation before sleep and ask yourself one question to dream on.",
            ),
        );
        table.insert(
            8,
            Narrative::new(
                "Strength and drive peak. Dreams are about achievement and overcoming obstacles.",
                "Energy and confidence are high; a good day to tackle hard tasks.",
                "Channel the energy into one clear goal and avoid late caffeine.",
            ),
        );
        table.insert(
            9,
            Narrative::new(
                "A cycle is closing. Dreams bring resolution and letting go.",
                "You may feel ready to finish old business and clear space.",
                "Review your journal for themes that have resolved and set an intention for the next cycle.",
            ),
        );
        table
    }
}
