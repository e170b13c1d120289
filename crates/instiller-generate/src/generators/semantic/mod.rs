use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, CountryName, StateAbbr, StreetName, ZipCode};
use fake::faker::name::en::{FirstName, LastName, Title};
use rand_chacha::ChaCha8Rng;

use crate::errors::Result;
use crate::generators::{GeneratorPlugin, PluginRegistry, PluginRng, pattern_or};

pub const HUMAN_NAMES: &str = "HUMAN_NAMES";
pub const ADDRESS: &str = "ADDRESS";

const DEFAULT_NAME_TEMPLATE: &str = "{first} {last}";
const DEFAULT_ADDRESS_TEMPLATE: &str = "{building} {street}, {city}, {state} {zip}";

/// Register the name and address templates.
pub fn register(registry: &mut PluginRegistry, seed: Option<u64>) {
    registry.register(
        HUMAN_NAMES,
        TemplatePlugin {
            rng: PluginRng::new(HUMAN_NAMES, seed),
            default_template: DEFAULT_NAME_TEMPLATE,
            slots: NAME_SLOTS,
        },
    );
    registry.register(
        ADDRESS,
        TemplatePlugin {
            rng: PluginRng::new(ADDRESS, seed),
            default_template: DEFAULT_ADDRESS_TEMPLATE,
            slots: ADDRESS_SLOTS,
        },
    );
}

type Slot = (&'static str, fn(&mut ChaCha8Rng) -> String);

const NAME_SLOTS: &[Slot] = &[
    ("{first}", first_name),
    ("{last}", last_name),
    ("{title}", title),
];

const ADDRESS_SLOTS: &[Slot] = &[
    ("{building}", building),
    ("{street}", street),
    ("{city}", city),
    ("{state}", state),
    ("{zip}", zip),
    ("{country}", country),
];

fn first_name(rng: &mut ChaCha8Rng) -> String {
    FirstName().fake_with_rng(rng)
}

fn last_name(rng: &mut ChaCha8Rng) -> String {
    LastName().fake_with_rng(rng)
}

fn title(rng: &mut ChaCha8Rng) -> String {
    Title().fake_with_rng(rng)
}

fn building(rng: &mut ChaCha8Rng) -> String {
    BuildingNumber().fake_with_rng(rng)
}

fn street(rng: &mut ChaCha8Rng) -> String {
    StreetName().fake_with_rng(rng)
}

fn city(rng: &mut ChaCha8Rng) -> String {
    CityName().fake_with_rng(rng)
}

fn state(rng: &mut ChaCha8Rng) -> String {
    StateAbbr().fake_with_rng(rng)
}

fn zip(rng: &mut ChaCha8Rng) -> String {
    ZipCode().fake_with_rng(rng)
}

fn country(rng: &mut ChaCha8Rng) -> String {
    CountryName().fake_with_rng(rng)
}

/// Fills `{slot}` markers of a template with fake data.
///
/// Each marker occurrence gets its own draw; text outside markers is kept.
struct TemplatePlugin {
    rng: PluginRng,
    default_template: &'static str,
    slots: &'static [Slot],
}

impl GeneratorPlugin for TemplatePlugin {
    fn generate(&self, pattern: &str, _seed: &str) -> Result<String> {
        let template = pattern_or(pattern, self.default_template);
        self.rng.with(|rng| {
            let mut output = template.to_string();
            for (marker, draw) in self.slots {
                let mut from = 0;
                while let Some(offset) = output[from..].find(marker) {
                    let start = from + offset;
                    let value = draw(rng);
                    output.replace_range(start..start + marker.len(), &value);
                    from = start + value.len();
                }
            }
            output
        })
    }
}
