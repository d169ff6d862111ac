//! Payload shapes carried through the demo pipelines.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemShape {
    Record,
    Pair,
    Order,
    Nested,
}

impl ItemShape {
    pub const ALL: [ItemShape; 4] = [
        ItemShape::Record,
        ItemShape::Pair,
        ItemShape::Order,
        ItemShape::Nested,
    ];

    /// Scenario title used in the demo report.
    pub fn title(self) -> &'static str {
        match self {
            ItemShape::Record => "Dict Data",
            ItemShape::Pair => "Tuple Data",
            ItemShape::Order => "Dataclass Orders",
            ItemShape::Nested => "Nested JSON",
        }
    }

    /// Builds the `index`-th item of this shape. Same index, same item.
    pub fn generate(self, index: usize) -> Item {
        let id = index as u64;
        match self {
            ItemShape::Record => {
                let mut rng = StdRng::seed_from_u64(id);
                Item::Record {
                    id,
                    value: rng.gen::<f64>(),
                }
            }
            ItemShape::Pair => Item::Pair(id, format!("task-{}", id)),
            ItemShape::Order => Item::Order(Order {
                order_id: id,
                total: id as f64 * 1.1,
            }),
            ItemShape::Nested => Item::Nested(json!({
                "user": { "id": id },
                "events": [{ "t": 0 }, { "t": 1 }],
            })),
        }
    }
}

impl fmt::Display for ItemShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum Item {
    Record { id: u64, value: f64 },
    Pair(u64, String),
    Order(Order),
    Nested(Value),
}

impl Item {
    pub fn shape(&self) -> ItemShape {
        match self {
            Item::Record { .. } => ItemShape::Record,
            Item::Pair(..) => ItemShape::Pair,
            Item::Order(_) => ItemShape::Order,
            Item::Nested(_) => ItemShape::Nested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        for shape in ItemShape::ALL {
            assert_eq!(shape.generate(7), shape.generate(7));
            assert_eq!(shape.generate(7).shape(), shape);
        }
    }

    #[test]
    fn test_record_values_in_unit_range() {
        for i in 0..50 {
            match ItemShape::Record.generate(i) {
                Item::Record { id, value } => {
                    assert_eq!(id, i as u64);
                    assert!((0.0..1.0).contains(&value));
                }
                other => panic!("unexpected item {:?}", other),
            }
        }
    }

    #[test]
    fn test_pair_and_order_contents() {
        assert_eq!(ItemShape::Pair.generate(3), Item::Pair(3, "task-3".to_string()));
        match ItemShape::Order.generate(4) {
            Item::Order(order) => {
                assert_eq!(order.order_id, 4);
                assert!((order.total - 4.4).abs() < 1e-9);
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_nested_shape() {
        let Item::Nested(value) = ItemShape::Nested.generate(5) else {
            panic!("expected nested item");
        };
        assert_eq!(value["user"]["id"], 5);
        assert_eq!(value["events"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["events"][1]["t"], 1);
    }

    #[test]
    fn test_titles() {
        assert_eq!(ItemShape::Record.to_string(), "Dict Data");
        assert_eq!(ItemShape::Nested.title(), "Nested JSON");
    }

    #[test]
    fn test_serialized_tag() {
        let json = serde_json::to_value(ItemShape::Pair.generate(1)).unwrap();
        assert_eq!(json["shape"], "pair");
        assert_eq!(json["data"][1], "task-1");
    }
}
