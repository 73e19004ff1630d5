// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::common::Result;
use crate::function::{Function, Rgb, parse_function};
use crate::results::{Samples, Specs};
use crate::{capacity_err, input_err};

/// Most functions a registry holds at once.
pub const MAX_FUNCTIONS: usize = 16;

/// The registry of parsed functions. Names are unique; order is
/// registration order, and removal keeps the relative order of the rest.
#[cfg_attr(feature = "debug-derive", derive(Debug))]
#[derive(Clone)]
pub struct FunctionManager {
    functions: Vec<Function>,
}

impl Default for FunctionManager {
    fn default() -> Self {
        FunctionManager::new()
    }
}

impl FunctionManager {
    pub fn new() -> Self {
        FunctionManager {
            functions: Vec::with_capacity(MAX_FUNCTIONS),
        }
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.functions.len() >= MAX_FUNCTIONS
    }

    /// Parse `definition` and register it. On error nothing is registered.
    pub fn add(&mut self, definition: &str, color: Option<Rgb>) -> Result<&Function> {
        if self.is_full() {
            return capacity_err!(
                OutOfMemory,
                format!("function registry is full ({MAX_FUNCTIONS} functions)")
            );
        }

        let function = parse_function(definition, self, color)?;
        log::debug!(
            "registered {} at slot {} of {MAX_FUNCTIONS}",
            function.name,
            self.functions.len()
        );
        self.functions.push(function);
        Ok(&self.functions[self.functions.len() - 1])
    }

    pub fn remove(&mut self, name: &str) -> Result<Function> {
        let Some(pos) = self.position(name) else {
            return input_err!(InvalidInput, format!("no function named '{name}'"));
        };
        log::debug!("removing {name} from slot {pos}");
        Ok(self.functions.remove(pos))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.functions.iter().position(|f| f.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn set_visible(&mut self, name: &str, is_visible: bool) -> Result<()> {
        match self.functions.iter_mut().find(|f| f.name == name) {
            Some(f) => {
                f.is_visible = is_visible;
                Ok(())
            }
            None => input_err!(InvalidInput, format!("no function named '{name}'")),
        }
    }

    /// Flip a function's visibility, returning the new value.
    pub fn toggle_visible(&mut self, name: &str) -> Result<bool> {
        match self.functions.iter_mut().find(|f| f.name == name) {
            Some(f) => {
                f.is_visible = !f.is_visible;
                Ok(f.is_visible)
            }
            None => input_err!(InvalidInput, format!("no function named '{name}'")),
        }
    }

    /// Sample every visible function over `specs`, in registry order.
    pub fn sample_visible(&self, specs: &Specs) -> Result<Vec<(&str, Rgb, Samples)>> {
        specs.validate()?;
        sample_all(&self.functions, specs)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn sample_all<'a>(
    functions: &'a [Function],
    specs: &Specs,
) -> Result<Vec<(&'a str, Rgb, Samples)>> {
    use rayon::prelude::*;

    functions
        .par_iter()
        .filter(|f| f.is_visible)
        .map(|f| f.sample(specs).map(|samples| (f.name.as_str(), f.color, samples)))
        .collect()
}

#[cfg(target_arch = "wasm32")]
fn sample_all<'a>(
    functions: &'a [Function],
    specs: &Specs,
) -> Result<Vec<(&'a str, Rgb, Samples)>> {
    functions
        .iter()
        .filter(|f| f.is_visible)
        .map(|f| f.sample(specs).map(|samples| (f.name.as_str(), f.color, samples)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ErrorCode, ErrorKind};

    const NAMES: &str = "abcdefghijklmnopqrstuvwxyz";

    #[test]
    fn add_get_remove() {
        let mut manager = FunctionManager::new();
        assert!(manager.is_empty());

        manager.add("f(x) = x^2", None).unwrap();
        manager.add("g(x) = 2x", None).unwrap();
        manager.add("y = x + 1", None).unwrap();
        assert_eq!(3, manager.len());
        assert!(manager.contains("g"));
        assert!(!manager.contains("h"));
        assert_eq!(Some(4.0), manager.get("g").map(|g| g.evaluate(2.0).unwrap()));
        assert!(manager.get("h").is_none());

        let removed = manager.remove("f").unwrap();
        assert_eq!("f", removed.name);
        let names: Vec<&str> = manager.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(vec!["g", "y"], names);

        let err = manager.remove("f").unwrap_err();
        assert_eq!(ErrorCode::InvalidInput, err.code);
        assert_eq!(ErrorKind::Input, err.kind);
    }

    #[test]
    fn duplicate_names() {
        let mut manager = FunctionManager::new();
        manager.add("f(x) = x", None).unwrap();

        let err = manager.add("f(t) = t + 1", None).unwrap_err();
        assert_eq!(ErrorCode::InvalidInput, err.code);
        assert_eq!(Some("function 'f' already exists".to_owned()), err.details);
        assert_eq!(1, manager.len());

        manager.remove("f").unwrap();
        manager.add("f(t) = t + 1", None).unwrap();
        assert_eq!("t", manager.get("f").unwrap().parameter);
    }

    #[test]
    fn failed_add_registers_nothing() {
        let mut manager = FunctionManager::new();
        assert!(manager.add("f(x) = (x", None).is_err());
        assert!(manager.is_empty());
        assert!(!manager.contains("f"));

        for def in ["f(x) = 2 +", "h(x) = ()", "k(x) = *2", "m(x) = 3! - 1"] {
            assert!(manager.add(def, None).is_err(), "{def}");
        }
        assert!(manager.is_empty());

        manager.add("g(x) = x", None).unwrap();
        let specs = Specs::new(0.0, 2.0, 1.0).unwrap();
        let curves = manager.sample_visible(&specs).unwrap();
        assert_eq!(1, curves.len());
        assert_eq!(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)], curves[0].2.points);
    }

    #[test]
    fn capacity() {
        let mut manager = FunctionManager::new();
        for name in NAMES.chars().take(MAX_FUNCTIONS) {
            manager.add(&format!("{name}(t) = t"), None).unwrap();
        }
        assert!(manager.is_full());

        let err = manager.add("z(t) = t", None).unwrap_err();
        assert_eq!(ErrorCode::OutOfMemory, err.code);
        assert_eq!(ErrorKind::Capacity, err.kind);

        manager.remove("c").unwrap();
        manager.add("z(t) = t", None).unwrap();
        assert_eq!(MAX_FUNCTIONS, manager.len());
        assert_eq!("z", manager.iter().last().unwrap().name);
    }

    #[test]
    fn default_colors_follow_registration_order() {
        let mut manager = FunctionManager::new();
        let f = manager.add("f(x) = x", None).unwrap().color;
        let g = manager.add("g(x) = x", Some(Rgb::PINK)).unwrap().color;
        let h = manager.add("h(x) = x", None).unwrap().color;
        assert_eq!(Rgb::RED, f);
        assert_eq!(Rgb::PINK, g);
        assert_eq!(Rgb::YELLOW, h);
    }

    #[test]
    fn visibility() {
        let mut manager = FunctionManager::new();
        manager.add("f(x) = x", None).unwrap();
        manager.add("g(x) = 1/x", None).unwrap();
        manager.add("h(x) = 2", None).unwrap();

        assert_eq!(false, manager.toggle_visible("g").unwrap());
        assert!(!manager.get("g").unwrap().is_visible);
        assert_eq!(true, manager.toggle_visible("g").unwrap());
        manager.set_visible("h", false).unwrap();

        assert!(manager.set_visible("q", true).is_err());
        assert!(manager.toggle_visible("q").is_err());

        let specs = Specs::new(-1.0, 1.0, 1.0).unwrap();
        let curves = manager.sample_visible(&specs).unwrap();
        let names: Vec<&str> = curves.iter().map(|(name, _, _)| *name).collect();
        assert_eq!(vec!["f", "g"], names);

        let (_, color, g) = &curves[1];
        assert_eq!(Rgb::ORANGE, *color);
        assert_eq!(vec![0.0], g.undefined_xs);
        assert_eq!(vec![(-1.0, -1.0), (1.0, 1.0)], g.points);
    }

    #[test]
    fn sample_visible_propagates_contract_errors() {
        let mut manager = FunctionManager::new();
        manager.add("f(x) = x", None).unwrap();
        let specs = Specs {
            start: 1.0,
            stop: -1.0,
            ..Specs::default()
        };
        let err = manager.sample_visible(&specs).unwrap_err();
        assert_eq!(ErrorKind::Contract, err.kind);
    }
}
