extern crate hemera;

mod eckstein_hechler;
mod ephemeris;
mod events;
mod harvester;
mod scheduler;
