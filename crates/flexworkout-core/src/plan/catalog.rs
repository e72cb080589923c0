//! Built-in content: the default workout and the office stretch catalogue.

use serde::{Deserialize, Serialize};

use super::model::{Plan, Section, Step};

/// A short stretch suggested during a break.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stretch {
    pub name: String,
    pub desc: String,
}

impl Stretch {
    fn new(name: &str, desc: &str) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
        }
    }
}

/// Stretches grouped by body area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StretchCategory {
    pub name: String,
    pub items: Vec<Stretch>,
}

fn section(name: &str, tips: &str, rounds: Option<u32>, steps: Vec<Step>) -> Section {
    Section {
        name: name.into(),
        tips: tips.into(),
        allow_rounds: rounds.is_some(),
        default_rounds: rounds.unwrap_or(1),
        max_rounds: rounds.unwrap_or(1),
        steps,
    }
}

/// The built-in twenty-minute routine.
pub fn default_plan() -> Plan {
    let rest = || Step::new("Rest", "", 15);
    Plan::new(vec![
        section(
            "Warm-up",
            "Wake the body up and loosen the joints. Breathe naturally throughout.",
            None,
            vec![
                Step::new("Neck circles", "Lead with the chin and slowly trace half circles forward, left, back, then reverse. Move only the neck.", 60),
                Step::new("Shoulder clock", "Arms relaxed. Roll the shoulders slowly forward, up, back and down. Thirty seconds each direction.", 60),
                Step::new("Cat-cow", "On all fours. Inhale, drop the belly and lift the head. Exhale, round the back and tuck the chin.", 60),
                Step::new("Marching knee lifts", "Walk in place, lifting the knees gently towards the chest and swinging the arms.", 60),
                Step::new("Ankle and wrist circles", "Seated, extend legs and arms and slowly circle the ankles and wrists.", 60),
            ],
        ),
        section(
            "Strength",
            "Focus on control and muscle feel, not speed or reps.",
            Some(2),
            vec![
                Step::new("Wall angels", "Back against the wall, arms in a W shape. Slide up into a Y and back down, feeling the shoulder blades move.", 45),
                rest(),
                Step::new("Chair squats", "Sit at the edge of a chair, feet shoulder-width. Stand up fully, then lower with control until you just touch the seat.", 45),
                rest(),
                Step::new("Glute bridge", "Lie on your back, knees bent. Lift the hips until knees, hips and shoulders line up, squeeze for a second, lower slowly.", 45),
                rest(),
                Step::new("Kneeling push-ups", "Hands slightly wider than shoulders. Feel the chest stretch on the way down, keep a soft bend at the top.", 45),
                rest(),
                Step::new("Bird dog", "On all fours, extend the opposite arm and leg into one line, keep the core tight, return slowly. Switch sides.", 45),
                rest(),
            ],
        ),
        section(
            "Cardio",
            "Low impact and steady. Keep the heart rate gently raised.",
            None,
            vec![
                Step::new("March in place", "Normal pace.", 60),
                Step::new("March with side leg lifts", "Alternate sides, lifting the leg out gently to open the hips.", 60),
                Step::new("March with knee lifts", "Back to an easy march, lifting the knees now and then.", 60),
            ],
        ),
        section(
            "Cool-down",
            "Stretch and breathe to let the body settle.",
            None,
            vec![
                Step::new("Quad stretch", "Standing with one hand on the wall, pull the heel of the same-side foot towards the glutes.", 30),
                Step::new("Switch sides", "Stretch the other leg.", 30),
                Step::new("Chest and shoulder stretch", "Clasp the hands behind the back and lift the arms gently. Lean into a wall if that is too much.", 30),
                Step::new("Belly breathing", "One hand on the belly. Inhale through the nose for four seconds, exhale through the mouth for six.", 30),
            ],
        ),
    ])
}

/// Office-friendly stretches, grouped by body area.
pub fn stretch_catalogue() -> Vec<StretchCategory> {
    let category = |name: &str, items: Vec<Stretch>| StretchCategory {
        name: name.into(),
        items,
    };
    vec![
        category(
            "Neck",
            vec![
                Stretch::new("Chin tucks", "Sit tall and draw the chin straight back, hold two seconds, release."),
                Stretch::new("Side neck stretch", "Tilt one ear towards the shoulder and hold, then switch sides."),
                Stretch::new("Look over the shoulder", "Turn the head slowly to look behind you on each side."),
            ],
        ),
        category(
            "Shoulders",
            vec![
                Stretch::new("Shoulder rolls", "Roll both shoulders backwards in big slow circles."),
                Stretch::new("Cross-body arm stretch", "Pull one arm across the chest with the other hand, then switch."),
                Stretch::new("Doorway chest opener", "Rest the forearms on a door frame and lean gently forward."),
            ],
        ),
        category(
            "Back",
            vec![
                Stretch::new("Seated twist", "Hold the chair back and rotate the torso, then the other way."),
                Stretch::new("Standing side bend", "Reach one arm overhead and lean to the opposite side."),
                Stretch::new("Forward fold", "Stand, soften the knees and let the upper body hang."),
            ],
        ),
        category(
            "Legs",
            vec![
                Stretch::new("Calf raises", "Rise onto the toes and lower slowly."),
                Stretch::new("Standing hamstring stretch", "Heel on a low step, hinge forward with a straight back."),
                Stretch::new("Hip flexor lunge", "Step into a short lunge and push the hips gently forward."),
            ],
        ),
    ]
}

/// The catalogue flattened in category order.
pub fn flattened_stretches() -> Vec<Stretch> {
    stretch_catalogue()
        .into_iter()
        .flat_map(|c| c.items)
        .collect()
}
