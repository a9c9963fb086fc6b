//! Access tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Visibility of a block resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Only the block itself.
    Private,
    /// The block and every block extending it.
    Protected,
    /// Any block holding a wiring to this one.
    Public,
}

impl Access {
    /// All tiers, narrowest first.
    pub const ALL: [Access; 3] = [Access::Private, Access::Protected, Access::Public];

    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Private => "private",
            Access::Protected => "protected",
            Access::Public => "public",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per access tier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tiers<T> {
    private: T,
    protected: T,
    public: T,
}

impl<T> Tiers<T> {
    pub fn new(private: T, protected: T, public: T) -> Self {
        Self {
            private,
            protected,
            public,
        }
    }

    /// Build each tier from its access level.
    pub fn from_fn(mut f: impl FnMut(Access) -> T) -> Self {
        Self {
            private: f(Access::Private),
            protected: f(Access::Protected),
            public: f(Access::Public),
        }
    }

    pub fn get(&self, access: Access) -> &T {
        match access {
            Access::Private => &self.private,
            Access::Protected => &self.protected,
            Access::Public => &self.public,
        }
    }

    pub fn get_mut(&mut self, access: Access) -> &mut T {
        match access {
            Access::Private => &mut self.private,
            Access::Protected => &mut self.protected,
            Access::Public => &mut self.public,
        }
    }

    /// Transform every tier, keeping the access level alongside.
    pub fn map<U>(self, mut f: impl FnMut(Access, T) -> U) -> Tiers<U> {
        Tiers {
            private: f(Access::Private, self.private),
            protected: f(Access::Protected, self.protected),
            public: f(Access::Public, self.public),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_serde_names() {
        let json = serde_json::to_string(&Access::Protected).unwrap();
        assert_eq!(json, "\"protected\"");

        let back: Access = serde_json::from_str("\"public\"").unwrap();
        assert_eq!(back, Access::Public);
    }

    #[test]
    fn access_display() {
        assert_eq!(format!("{}", Access::Private), "private");
    }

    #[test]
    fn tiers_from_fn_and_get() {
        let tiers = Tiers::from_fn(|access| access.as_str().len());
        assert_eq!(*tiers.get(Access::Private), 7);
        assert_eq!(*tiers.get(Access::Protected), 9);
        assert_eq!(*tiers.get(Access::Public), 6);
    }

    #[test]
    fn tiers_map_keeps_access() {
        let tiers = Tiers::new(1, 2, 3).map(|access, n| format!("{}={}", access, n));
        assert_eq!(tiers.get(Access::Protected), "protected=2");
    }

    #[test]
    fn tiers_get_mut() {
        let mut tiers: Tiers<Vec<u8>> = Tiers::default();
        tiers.get_mut(Access::Public).push(7);
        assert_eq!(tiers.get(Access::Public), &vec![7]);
        assert!(tiers.get(Access::Private).is_empty());
    }
}
