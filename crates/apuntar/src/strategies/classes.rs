//! Class-anchored strategies.

use super::{class_selector, Ctx, Strategy};
use crate::address::{Address, Tier};
use crate::budget::StrategyCost;
use crate::text::looks_dynamic;

/// Up to four stable classes, alone, tag-qualified, and pairwise combined.
pub struct Classes;

const MAX_CLASSES: usize = 4;

impl Strategy for Classes {
    fn name(&self) -> &'static str {
        "class"
    }
    fn tier(&self) -> Tier {
        Tier::Core
    }
    fn cost(&self) -> StrategyCost {
        StrategyCost::Cheap
    }

    fn generate(&self, ctx: &Ctx<'_>, out: &mut Vec<Address>) {
        let Some(data) = ctx.doc.element(ctx.el) else {
            return;
        };
        let stable: Vec<&str> = data
            .classes()
            .filter(|c| !c.is_empty() && !looks_dynamic(c))
            .take(MAX_CLASSES)
            .collect();

        for class in &stable {
            let bare = class_selector(class);
            if !ctx.push_css(out, bare, self.name(), Tier::Core) {
                let qualified = format!("{}{}", ctx.tag(), class_selector(class));
                ctx.push_css(out, qualified, self.name(), Tier::Core);
            }
        }

        // First pair that disambiguates; more combinations rarely help and
        // read worse.
        'pairs: for (i, a) in stable.iter().enumerate() {
            for b in &stable[i + 1..] {
                let combined = format!("{}{}", class_selector(a), class_selector(b));
                if ctx.push_css(out, combined, self.name(), Tier::Core) {
                    break 'pairs;
                }
            }
        }
    }
}
