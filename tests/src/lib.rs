#![cfg(test)]

mod fakes;
mod orchestration;
