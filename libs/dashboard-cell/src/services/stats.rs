//! Branch statistics computed over already-fetched, already-scoped rows.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate};

use shared_models::SoftDelete;

use crate::models::{
    AppointmentRow, AppointmentSummary, DashboardRows, DashboardSummary, DoctorId, DoctorStats,
    InvoiceRow,
};

/// Inclusive calendar window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }
}

/// Windows the dashboard reports on, relative to `today`. Weeks run Monday
/// to Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingPeriods {
    pub today: NaiveDate,
    pub month_to_date: Period,
    pub last_month: Period,
    pub this_week: Period,
    pub last_week: Period,
}

impl ReportingPeriods {
    pub fn for_date(today: NaiveDate) -> Self {
        let first_of_month = today.with_day(1).unwrap_or(today);
        let last_of_previous = first_of_month - Duration::days(1);
        let first_of_previous = last_of_previous.with_day(1).unwrap_or(last_of_previous);

        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let sunday = monday + Duration::days(6);

        Self {
            today,
            month_to_date: Period { first: first_of_month, last: today },
            last_month: Period { first: first_of_previous, last: last_of_previous },
            this_week: Period { first: monday, last: sunday },
            last_week: Period {
                first: monday - Duration::days(7),
                last: monday - Duration::days(1),
            },
        }
    }
}

/// Percent change from `previous` to `current`, 0 when there is no baseline.
pub fn growth_rate(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        round2((current - previous) / previous * 100.0)
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn income<'a>(invoices: impl Iterator<Item = &'a InvoiceRow>) -> f64 {
    round2(invoices.map(|invoice| invoice.total_price).sum())
}

/// Rows must already be restricted to one branch.
pub fn summarize(rows: &DashboardRows, today: NaiveDate) -> DashboardSummary {
    let periods = ReportingPeriods::for_date(today);

    let patients: Vec<_> = rows.patients.iter().filter(|p| p.is_visible()).collect();
    let appointments: Vec<_> = rows.appointments.iter().filter(|a| a.is_visible()).collect();
    let invoices: Vec<_> = rows.invoices.iter().filter(|i| i.is_visible()).collect();

    let patients_this_month = patients
        .iter()
        .filter(|p| p.added_on().is_some_and(|day| periods.month_to_date.contains(day)))
        .count();
    let patients_last_month = patients
        .iter()
        .filter(|p| p.added_on().is_some_and(|day| periods.last_month.contains(day)))
        .count();

    let income_this_week = income(
        invoices
            .iter()
            .copied()
            .filter(|i| periods.this_week.contains(i.created_at.date_naive())),
    );
    let income_last_week = income(
        invoices
            .iter()
            .copied()
            .filter(|i| periods.last_week.contains(i.created_at.date_naive())),
    );

    DashboardSummary {
        total_patients_count: patients.len(),
        patients_this_month,
        patients_last_month,
        patients_growth_rate: growth_rate(patients_this_month as f64, patients_last_month as f64),

        appointments_this_week: appointments
            .iter()
            .filter(|a| periods.this_week.contains(a.date))
            .count(),
        appointments_today: appointments.iter().filter(|a| a.date == today).count(),
        active_doctors_count: rows
            .doctors
            .iter()
            .filter(|d| d.is_visible() && d.is_active)
            .count(),

        total_income: income(invoices.iter().copied()),
        income_this_week,
        income_last_week,
        income_growth_rate: growth_rate(income_this_week, income_last_week),
    }
}

/// Statistics of one doctor from the branch's appointments and invoices.
pub fn doctor_stats(
    doctor_id: DoctorId,
    appointments: &[AppointmentRow],
    invoices: &[InvoiceRow],
) -> DoctorStats {
    let own: Vec<&AppointmentRow> = appointments
        .iter()
        .filter(|a| a.doctor_id == doctor_id && a.is_visible())
        .collect();
    let appointment_ids: BTreeSet<i64> = own.iter().map(|a| a.id).collect();

    DoctorStats {
        doctor_id,
        total_patients: own.iter().map(|a| a.patient_id).collect::<BTreeSet<_>>().len(),
        total_appointments: own.len(),
        completed_appointments: own.iter().filter(|a| a.is_completed()).count(),
        total_revenue: income(invoices.iter().filter(|i| {
            i.is_visible()
                && i.appointment_id
                    .is_some_and(|id| appointment_ids.contains(&id))
        })),
    }
}

/// A doctor's visible appointments, newest first. Same-day entries are
/// ordered by time, then id, both descending.
pub fn latest_appointments(doctor_id: DoctorId, appointments: &[AppointmentRow]) -> Vec<AppointmentSummary> {
    let mut own: Vec<&AppointmentRow> = appointments
        .iter()
        .filter(|a| a.doctor_id == doctor_id && a.is_visible())
        .collect();
    own.sort_by(|a, b| (b.date, b.time, b.id).cmp(&(a.date, a.time, a.id)));
    own.into_iter().map(AppointmentSummary::from).collect()
}
