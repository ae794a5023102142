use std::{cell::RefCell, collections::HashMap, time::Duration};

use crate::{
    FermataError, Opaque,
    common::{ArgSignature, BufferOptions, CallableId},
    key::{ArgKey, resolve},
};

fn keyed() -> BufferOptions {
    BufferOptions {
        key_on_arguments: true,
        ..BufferOptions::fixed(Duration::from_millis(100))
    }
}

fn unkeyed() -> BufferOptions {
    BufferOptions::fixed(Duration::from_millis(100))
}

fn sig<A: ArgKey>(args: &A) -> ArgSignature {
    let id = CallableId::next();
    resolve(id, args, &keyed()).unwrap().args().unwrap()
}

#[test]
fn unkeyed_calls_share_one_key_regardless_of_arguments() {
    let id = CallableId::next();

    let a = resolve(id, &("foo",), &unkeyed()).unwrap();
    let b = resolve(id, &("bar",), &unkeyed()).unwrap();

    assert_eq!(a, b);
    assert!(a.args().is_none());
}

#[test]
fn unkeyed_calls_never_inspect_arguments() {
    let id = CallableId::next();

    // Opaque fails signature derivation, but without keying it is never asked.
    let key = resolve(id, &Opaque(RefCell::new(1)), &unkeyed()).unwrap();

    assert!(key.args().is_none());
}

#[test]
fn distinct_callables_have_distinct_keys() {
    let args = ("foo",);

    let a = resolve(CallableId::next(), &args, &unkeyed()).unwrap();
    let b = resolve(CallableId::next(), &args, &unkeyed()).unwrap();

    assert_ne!(a, b);
}

#[test]
fn equal_arguments_resolve_to_equal_signatures() {
    assert_eq!(sig(&("foo", 1u32)), sig(&("foo", 1u32)));
}

#[test]
fn different_argument_values_resolve_to_different_signatures() {
    assert_ne!(sig(&("foo", "bar")), sig(&("foo", "baz")));
}

#[test]
fn string_framing_keeps_adjacent_values_apart() {
    assert_ne!(sig(&("foo", "")), sig(&("fo", "o")));
    assert_ne!(sig(&("ab", "c")), sig(&("a", "bc")));
}

#[test]
fn tuple_arity_is_part_of_the_signature() {
    assert_ne!(sig(&("foo",)), sig(&("foo", "")));
}

#[test]
fn map_signature_is_independent_of_insertion_order() {
    let mut forward = HashMap::new();
    forward.insert("arg1", 1u32);
    forward.insert("arg2", 2u32);

    let mut reverse = HashMap::new();
    reverse.insert("arg2", 2u32);
    reverse.insert("arg1", 1u32);

    assert_eq!(sig(&forward), sig(&reverse));
}

#[test]
fn map_values_distinguish_signatures() {
    let mut bar = HashMap::new();
    bar.insert("arg2", "bar");

    let mut baz = HashMap::new();
    baz.insert("arg2", "baz");

    assert_ne!(sig(&bar), sig(&baz));
}

#[test]
fn none_and_some_are_distinct() {
    assert_ne!(sig(&(None::<u32>,)), sig(&(Some(0u32),)));
}

#[test]
fn negative_zero_matches_positive_zero() {
    assert_eq!(sig(&(-0.0f64,)), sig(&(0.0f64,)));
}

#[test]
fn nan_arguments_fail_resolution() {
    let id = CallableId::next();
    let result = resolve(id, &(f64::NAN,), &keyed());

    assert!(matches!(result, Err(FermataError::KeyResolution(_))));
}

#[test]
fn opaque_arguments_fail_resolution_when_keying_is_on() {
    let id = CallableId::next();
    let result = resolve(id, &Opaque(RefCell::new(1)), &keyed());

    assert!(matches!(result, Err(FermataError::KeyResolution(_))));
}
