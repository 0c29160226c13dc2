//! Serializes [`ScopedId`] as its native integer representation.

use ::serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::ScopedId;

impl Serialize for ScopedId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_raw().serialize(s)
    }
}

impl<'de> Deserialize<'de> for ScopedId {
    /// # Errors
    ///
    /// Fails if the value has any of the reserved high bits set.
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u64::deserialize(d)?;
        let id = Self::from_raw(raw);
        if !id.is_valid() {
            return Err(de::Error::custom(format_args!(
                "{raw} sets reserved bits of a scoped ID"
            )));
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::ScopedId;

    #[test]
    fn serializes_as_plain_integer() {
        let id = ScopedId::from_components(7, 1, 2, 3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, id.to_raw().to_string());
        let back: ScopedId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn rejects_reserved_bits() {
        let json = u64::MAX.to_string();
        assert!(serde_json::from_str::<ScopedId>(&json).is_err());
    }
}
