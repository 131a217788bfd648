use crate::domain::route::Route;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct RouteRow<'a> {
    id: &'a str,
    name: &'a str,
    origin: &'a str,
    destination: &'a str,
    stops: usize,
    schedules: usize,
}

#[derive(Serialize)]
struct ScheduleRow<'a> {
    schedule_id: &'a str,
    departure: &'a str,
    arrival: &'a str,
    days: String,
}

/// Writes route listings and timetables as CSV.
pub struct RouteWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RouteWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One row per route with its endpoints and how many stops and schedules it has.
    pub fn write_routes(&mut self, routes: &[Route]) -> Result<()> {
        for route in routes {
            self.writer.serialize(RouteRow {
                id: &route.id,
                name: &route.name,
                origin: route.origin().map(|s| s.name.as_str()).unwrap_or(""),
                destination: route.destination().map(|s| s.name.as_str()).unwrap_or(""),
                stops: route.stops.len(),
                schedules: route.schedules.len(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// The timetable of a single route.
    pub fn write_schedules(&mut self, route: &Route) -> Result<()> {
        for schedule in &route.schedules {
            self.writer.serialize(ScheduleRow {
                schedule_id: &schedule.id,
                departure: &schedule.departure_time,
                arrival: &schedule.arrival_time,
                days: schedule.days_of_week.join(" "),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
